//! wandaloo.com: query-paginated occasion listings. Detail pages hide
//! their option sections behind accordion toggles and expose the gallery as
//! full-size links rather than thumbnails.

use crate::extract::FieldProbe;
use crate::sites::{
    DetailField, DetailRules, ExtraField, ExtraSource, LinkRule, ListingRules, Pagination,
    SellerRule, SiteProfile,
};

const ICON_TAGS: &str = "ul.icons.clearfix li p.tag";

pub static PROFILE: SiteProfile = SiteProfile {
    name: "wandaloo",
    pagination: Pagination::PageQuery {
        template: "https://www.wandaloo.com/occasion/?marque=0&modele=0&budget=0&categorie=0&moteur=0&transmission=0&equipement=-&ville=0&vendeur=0&abonne=0&za&pg={page}",
        start: 1,
    },
    link_base: Some("https://www.wandaloo.com"),
    numeric_price: false,
    csv_delimiter: b',',
    listing: ListingRules {
        container: "li.odd",
        item: "li.odd, li.even",
        title: FieldProbe::Css("p.titre"),
        price: Some(FieldProbe::Css("p.prix")),
        published: Some(FieldProbe::Css("span.dateHeure")),
        link: LinkRule::Attr(FieldProbe::CssAttr("a.btn.orange-blanc.medium", "href")),
        seller: SellerRule::TextMarker("Pro."),
        scroll_after_load: false,
        extras: &[
            ExtraField {
                column: "Ville",
                source: ExtraSource::Dom(FieldProbe::Css("span.city")),
            },
            ExtraField {
                column: "Type de carburant",
                source: ExtraSource::Dom(FieldProbe::Nth("ul.detail li", 0)),
            },
            ExtraField {
                column: "Année",
                source: ExtraSource::Dom(FieldProbe::Nth("ul.detail li", 1)),
            },
            ExtraField {
                column: "Image URL",
                source: ExtraSource::Dom(FieldProbe::CssAttr("a.img img", "src")),
            },
        ],
    },
    detail: DetailRules {
        container: "ul.params.my-panel",
        reveal_css: &["p.head.accordion button.pull-right"],
        reveal_text: &[],
        scroll_before_extract: false,
        spec_row: "ul.params.my-panel li",
        spec_label: FieldProbe::Css("p.param"),
        spec_value: FieldProbe::Css("p.value"),
        labels: &[
            ("Année", DetailField::Year),
            ("Première main", DetailField::FirstHand),
            ("Dédouan", DetailField::Customs),
            ("Moteur", DetailField::FuelType),
            ("Puissance fiscale", DetailField::FiscalPower),
            ("État", DetailField::Condition),
        ],
        extra_probes: &[
            (DetailField::Sector, FieldProbe::Nth(ICON_TAGS, 1)),
            (DetailField::Creator, FieldProbe::Nth(ICON_TAGS, 2)),
            (DetailField::FirstHand, FieldProbe::Nth(ICON_TAGS, 3)),
            (DetailField::Mileage, FieldProbe::Nth(ICON_TAGS, 4)),
            (DetailField::FuelType, FieldProbe::Nth(ICON_TAGS, 5)),
            (DetailField::Transmission, FieldProbe::Nth(ICON_TAGS, 6)),
            (DetailField::SellerCity, FieldProbe::Nth(ICON_TAGS, 1)),
        ],
        // Option sections (Sécurité, Confort, Esthétique) list their items
        // as params outside the my-panel block.
        equipment: Some("ul.params:not(.my-panel) li p.param"),
        split_brand_from_title: true,
        gallery: "div.popup-gallery a",
        gallery_attr: "href",
        thumb_rewrite: None,
        image_ext_only: true,
    },
    listing_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Date de publication",
        "Année",
        "Type de carburant",
        "Créateur",
        "Ville",
        "URL de l'annonce",
        "Image URL",
        "Dossier d'images",
    ],
    detail_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Date de publication",
        "Année",
        "Type de carburant",
        "Transmission",
        "Créateur",
        "Type de véhicule",
        "Secteur",
        "Kilométrage",
        "Marque",
        "Modèle",
        "Nombre de portes",
        "Origine",
        "Première main",
        "Puissance fiscale",
        "État",
        "Équipements",
        "Ville du vendeur",
        "Dossier d'images",
        "Nombre d'images",
    ],
};
