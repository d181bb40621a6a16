//! moteur.ma: offset-paginated search (0, 30, 60, ...). The site publishes
//! its own numeric ad id in every detail URL; it is kept as a reference
//! column next to the engine's sequence id.

use crate::extract::FieldProbe;
use crate::sites::{
    DetailField, DetailRules, ExtraField, ExtraSource, LinkRule, ListingRules, Pagination,
    SellerRule, SiteProfile,
};

pub static PROFILE: SiteProfile = SiteProfile {
    name: "moteur",
    pagination: Pagination::Offset {
        base: "https://www.moteur.ma/fr/voiture/achat-voiture-occasion/",
        step: 30,
    },
    link_base: Some("https://www.moteur.ma"),
    numeric_price: false,
    csv_delimiter: b',',
    listing: ListingRules {
        container: "div.row-item",
        item: "div.row-item",
        title: FieldProbe::Css("h3.title_mark_model"),
        price: Some(FieldProbe::Css(".PriceListing")),
        published: None,
        link: LinkRule::Attr(FieldProbe::CssAttr("h3.title_mark_model a", "href")),
        seller: SellerRule::Unknown,
        scroll_after_load: false,
        extras: &[
            ExtraField {
                column: "Année",
                source: ExtraSource::Dom(FieldProbe::Nth("li", 1)),
            },
            ExtraField {
                column: "Ville",
                source: ExtraSource::Dom(FieldProbe::Nth("li", 2)),
            },
            ExtraField {
                column: "Type de carburant",
                source: ExtraSource::Dom(FieldProbe::Nth("li", 3)),
            },
            ExtraField {
                column: "Référence",
                source: ExtraSource::LinkCapture(r"/detail-annonce/(\d+)/"),
            },
        ],
    },
    detail: DetailRules {
        container: "div.detail_line",
        reveal_css: &[],
        reveal_text: &[],
        scroll_before_extract: false,
        spec_row: "div.detail_line",
        spec_label: FieldProbe::Nth("span", 0),
        spec_value: FieldProbe::Nth("span", 1),
        labels: &[
            ("Kilométrage", DetailField::Mileage),
            ("Année", DetailField::Year),
            ("Boite de vitesses", DetailField::Transmission),
            ("Carburant", DetailField::FuelType),
            ("Puissance", DetailField::FiscalPower),
            ("Nombre de portes", DetailField::Doors),
            ("Première main", DetailField::FirstHand),
            ("Véhicule dédouané", DetailField::Customs),
            ("Date", DetailField::Published),
        ],
        extra_probes: &[
            (
                DetailField::Description,
                FieldProbe::Css("div.options div.col-md-12"),
            ),
            (
                DetailField::Creator,
                FieldProbe::Css("a[href*='stock-professionnel']"),
            ),
            (DetailField::Sector, FieldProbe::Css("a[href*='ville']")),
        ],
        equipment: None,
        split_brand_from_title: false,
        gallery: "img[data-u='image'], .swiper-slide img",
        gallery_attr: "src",
        thumb_rewrite: None,
        image_ext_only: false,
    },
    listing_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Année",
        "Ville",
        "Type de carburant",
        "Référence",
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
        "Kilométrage",
        "Puissance fiscale",
        "Nombre de portes",
        "Première main",
        "Dédouané",
        "Description",
        "Secteur",
        "Créateur",
        "URL de l'annonce",
        "Dossier d'images",
        "Nombre d'images",
    ],
};
