//! avito.ma: the largest general classifieds site. Query-paginated search,
//! relative publication dates, seller storefront names on the cards.

use crate::extract::FieldProbe;
use crate::sites::{
    DetailField, DetailRules, ExtraField, ExtraSource, LinkRule, ListingRules, Pagination,
    SellerRule, SiteProfile,
};

pub static PROFILE: SiteProfile = SiteProfile {
    name: "avito",
    pagination: Pagination::PageQuery {
        template: "https://www.avito.ma/fr/maroc/v%C3%A9hicules?o={page}",
        start: 1,
    },
    link_base: Some("https://www.avito.ma"),
    numeric_price: false,
    csv_delimiter: b',',
    listing: ListingRules {
        container: "div.sc-1nre5ec-1",
        item: "a.sc-1jge648-0.jZXrfL",
        title: FieldProbe::Css("p.sc-1x0vz2r-0.iHApav"),
        price: Some(FieldProbe::Css("p.sc-1x0vz2r-0.dJAfqm")),
        published: Some(FieldProbe::Css("p.sc-1x0vz2r-0.layWaX")),
        link: LinkRule::Attr(FieldProbe::CssAttr("a", "href")),
        seller: SellerRule::NamedElement("p.sc-1x0vz2r-0.hNCqYw.sc-1wnmz4-5.dXzQnB"),
        scroll_after_load: true,
        extras: &[
            ExtraField {
                column: "Année",
                source: ExtraSource::Dom(FieldProbe::YearLike("span")),
            },
            ExtraField {
                column: "Type de carburant",
                source: ExtraSource::Dom(FieldProbe::TextAmong(
                    "span",
                    &["Essence", "Diesel", "Hybride", "Électrique"],
                )),
            },
            ExtraField {
                column: "Transmission",
                source: ExtraSource::Dom(FieldProbe::TextAmong(
                    "span",
                    &["Automatique", "Manuelle"],
                )),
            },
        ],
    },
    detail: DetailRules {
        container: "div.sc-qmn92k-0.cjptpz",
        reveal_css: &[],
        reveal_text: &["Afficher plus de détails"],
        scroll_before_extract: true,
        spec_row: "div.sc-qmn92k-0.cjptpz li",
        spec_label: FieldProbe::Css("span.sc-1x0vz2r-0.jZyObG"),
        spec_value: FieldProbe::Css("span.sc-1x0vz2r-0.gSLYtF"),
        labels: &[
            ("Secteur", DetailField::Sector),
            ("Kilométrage", DetailField::Mileage),
            ("Marque", DetailField::Brand),
            ("Modèle", DetailField::Model),
            ("Nombre de portes", DetailField::Doors),
            ("Origine", DetailField::Origin),
            ("Première main", DetailField::FirstHand),
            ("Puissance fiscale", DetailField::FiscalPower),
            ("État", DetailField::Condition),
            ("Type", DetailField::VehicleType),
        ],
        extra_probes: &[(
            DetailField::SellerCity,
            FieldProbe::Css("div.sc-1g3sn3w-7.bNWHpB span.sc-1x0vz2r-0.iotEHk"),
        )],
        equipment: Some("div.sc-1g3sn3w-15.evEiLa span.sc-1x0vz2r-0.bXFCIH"),
        split_brand_from_title: false,
        gallery: "div.picture img.sc-1gjavk-0",
        gallery_attr: "src",
        thumb_rewrite: None,
        image_ext_only: false,
    },
    listing_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Date de publication",
        "Année",
        "Type de carburant",
        "Transmission",
        "Créateur",
        "URL de l'annonce",
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
