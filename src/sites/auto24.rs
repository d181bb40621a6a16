//! auto24.ma: infinite-scroll storefront. Cards only navigate on click, so
//! link resolution goes through the address bar; thumbnails carry a
//! `/medium/` path segment that the full-resolution variant drops.

use crate::extract::FieldProbe;
use crate::sites::{
    DetailField, DetailRules, ExtraField, ExtraSource, LinkRule, ListingRules, Pagination,
    SellerRule, SiteProfile,
};

const FEATURES: &str = "div.card-features span.features-container";

pub static PROFILE: SiteProfile = SiteProfile {
    name: "auto24",
    pagination: Pagination::InfiniteScroll {
        url: "https://auto24.ma/buy-cars?isNewCar=false",
        max_scrolls: 5,
    },
    link_base: Some("https://auto24.ma"),
    numeric_price: true,
    csv_delimiter: b';',
    listing: ListingRules {
        container: "div.card-holder",
        item: "div.card-holder",
        title: FieldProbe::Css("span.card-model"),
        price: Some(FieldProbe::Css("span.card-price")),
        published: None,
        link: LinkRule::Navigate,
        seller: SellerRule::BadgePresence("div.card-brand-logo"),
        scroll_after_load: false,
        extras: &[
            ExtraField {
                column: "Transmission",
                source: ExtraSource::Dom(FieldProbe::NthLastLine(FEATURES, 0)),
            },
            ExtraField {
                column: "Type de carburant",
                source: ExtraSource::Dom(FieldProbe::NthLastLine(FEATURES, 1)),
            },
            ExtraField {
                column: "Kilométrage",
                source: ExtraSource::Dom(FieldProbe::NthLastLine(FEATURES, 2)),
            },
        ],
    },
    detail: DetailRules {
        container: "h1.car-name",
        reveal_css: &[],
        reveal_text: &[],
        scroll_before_extract: false,
        // Overview items and summary cards share the labeled-row shape, so
        // one selector list covers both families.
        spec_row: "div.overview-item, div.summary-card",
        spec_label: FieldProbe::Css("h3.overview-title, h3.summary-title"),
        spec_value: FieldProbe::Css("p.overview-value, div.summary-value"),
        labels: &[
            ("Date de mise en circulation", DetailField::Year),
            ("Kilométrage", DetailField::Mileage),
            ("Type de carburant", DetailField::FuelType),
            ("Boite de vitesse", DetailField::Transmission),
            ("Places", DetailField::Seats),
            ("Puissance fiscale", DetailField::FiscalPower),
            ("Condition", DetailField::Condition),
        ],
        extra_probes: &[],
        equipment: Some("h3.feature-title"),
        split_brand_from_title: false,
        gallery: "div.carousel-image img",
        gallery_attr: "src",
        thumb_rewrite: Some(("/medium/", "/")),
        image_ext_only: false,
    },
    listing_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Transmission",
        "Type de carburant",
        "Kilométrage",
        "Créateur",
        "URL de l'annonce",
        "Dossier d'images",
    ],
    detail_columns: &[
        "ID",
        "Titre",
        "Prix",
        "Année",
        "Kilométrage",
        "Type de carburant",
        "Transmission",
        "Places",
        "Puissance fiscale",
        "État",
        "Équipements",
        "Dossier d'images",
        "Nombre d'images",
        "URL de l'annonce",
    ],
};
