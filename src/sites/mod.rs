//! Declarative site profiles.
//!
//! Everything that differs between the four sources (URLs, pagination
//! style, selectors, label vocabulary, CSV layout) lives in these tables.
//! The harvester and enricher are generic over a profile, so adding a site
//! means adding data, not code.

pub mod auto24;
pub mod avito;
pub mod moteur;
pub mod wandaloo;

use crate::extract::FieldProbe;
use crate::models::ListingDetail;

/// How a site exposes more results.
#[derive(Debug, Clone, Copy)]
pub enum Pagination {
    /// `{page}` in the template is replaced with a 1-based page number.
    PageQuery {
        template: &'static str,
        start: u32,
    },
    /// Result offset appended to the base URL; the first page is the bare
    /// base.
    Offset { base: &'static str, step: u32 },
    /// One endless page, scrolled until its height stops growing or the
    /// attempt cap is reached.
    InfiniteScroll {
        url: &'static str,
        max_scrolls: u32,
    },
}

impl Pagination {
    /// URL for the 0-based page index, or `None` past the end.
    pub fn page_url(&self, index: u32) -> Option<String> {
        match self {
            Pagination::PageQuery { template, start } => {
                Some(template.replace("{page}", &(start + index).to_string()))
            }
            Pagination::Offset { base, step } => {
                if index == 0 {
                    Some((*base).to_string())
                } else {
                    Some(format!("{}{}", base, index * step))
                }
            }
            Pagination::InfiniteScroll { url, .. } => (index == 0).then(|| (*url).to_string()),
        }
    }

    pub fn is_infinite_scroll(&self) -> bool {
        matches!(self, Pagination::InfiniteScroll { .. })
    }
}

/// How the listing card exposes its detail-page URL.
#[derive(Debug, Clone, Copy)]
pub enum LinkRule {
    /// Read it straight off an attribute in the card.
    Attr(FieldProbe),
    /// The card only navigates on click: click through, read the address
    /// bar, go back.
    Navigate,
}

/// Best-effort seller classification rule. See the open question on badge
/// heuristics in DESIGN.md.
#[derive(Debug, Clone, Copy)]
pub enum SellerRule {
    /// A badge element inside the card marks a professional seller.
    BadgePresence(&'static str),
    /// A marker substring anywhere in the card text.
    TextMarker(&'static str),
    /// A named storefront element; its text becomes the seller name.
    NamedElement(&'static str),
    /// The site shows nothing usable on the card.
    Unknown,
}

/// A site-specific light field on the listing card.
#[derive(Debug, Clone, Copy)]
pub struct ExtraField {
    pub column: &'static str,
    pub source: ExtraSource,
}

#[derive(Debug, Clone, Copy)]
pub enum ExtraSource {
    Dom(FieldProbe),
    /// First capture group of the pattern, run against the resolved link.
    LinkCapture(&'static str),
}

/// Typed targets a detail-page label can project onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    VehicleType,
    Sector,
    Mileage,
    Brand,
    Model,
    Doors,
    Origin,
    FirstHand,
    FiscalPower,
    Condition,
    Year,
    FuelType,
    Transmission,
    Seats,
    Customs,
    Published,
    Description,
    Creator,
    SellerCity,
}

impl DetailField {
    pub fn apply(&self, detail: &mut ListingDetail, value: String) {
        match self {
            DetailField::VehicleType => detail.vehicle_type = value,
            DetailField::Sector => detail.sector = value,
            DetailField::Mileage => detail.mileage = value,
            DetailField::Brand => detail.brand = value,
            DetailField::Model => detail.model = value,
            DetailField::Doors => detail.doors = value,
            DetailField::Origin => detail.origin = value,
            DetailField::FirstHand => detail.first_hand = value,
            DetailField::FiscalPower => detail.fiscal_power = value,
            DetailField::Condition => detail.condition = value,
            DetailField::Year => detail.year = value,
            DetailField::FuelType => detail.fuel_type = value,
            DetailField::Transmission => detail.transmission = value,
            DetailField::Seats => detail.seats = value,
            DetailField::Customs => detail.customs = value,
            DetailField::Published => detail.published = value,
            DetailField::Description => detail.description = value,
            DetailField::Creator => detail.creator = value,
            DetailField::SellerCity => detail.seller_city = value,
        }
    }
}

/// Rules for harvesting a search/listing page.
#[derive(Debug, Clone, Copy)]
pub struct ListingRules {
    /// Element whose appearance means the page is usable.
    pub container: &'static str,
    /// One listing card.
    pub item: &'static str,
    pub title: FieldProbe,
    pub price: Option<FieldProbe>,
    pub published: Option<FieldProbe>,
    pub link: LinkRule,
    pub seller: SellerRule,
    /// Scroll to the bottom once after load to trigger lazy rendering.
    pub scroll_after_load: bool,
    pub extras: &'static [ExtraField],
}

/// Rules for enriching one detail page.
#[derive(Debug, Clone, Copy)]
pub struct DetailRules {
    /// Element whose appearance means the details rendered.
    pub container: &'static str,
    /// Selectors clicked once each to reveal hidden sections.
    pub reveal_css: &'static [&'static str],
    /// Buttons found by their text (CSS cannot match text content).
    pub reveal_text: &'static [&'static str],
    pub scroll_before_extract: bool,
    /// One labeled row of the spec list.
    pub spec_row: &'static str,
    pub spec_label: FieldProbe,
    pub spec_value: FieldProbe,
    /// Label vocabulary, matched case-insensitively by substring, first
    /// match wins. Unrecognized labels are ignored.
    pub labels: &'static [(&'static str, DetailField)],
    /// Fields read from fixed positions outside the labeled list.
    pub extra_probes: &'static [(DetailField, FieldProbe)],
    /// Item selector of the equipment/options section.
    pub equipment: Option<&'static str>,
    /// Derive brand/model by splitting the listing title.
    pub split_brand_from_title: bool,
    pub gallery: &'static str,
    pub gallery_attr: &'static str,
    /// Rewrite thumbnail URLs to their full-resolution variant.
    pub thumb_rewrite: Option<(&'static str, &'static str)>,
    /// Keep only URLs that end in an image extension.
    pub image_ext_only: bool,
}

/// Everything the engine needs to know about one source site.
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub name: &'static str,
    pub pagination: Pagination,
    /// Prefix for relative hrefs.
    pub link_base: Option<&'static str>,
    /// Clean the displayed price down to an integer at harvest time.
    pub numeric_price: bool,
    pub csv_delimiter: u8,
    pub listing: ListingRules,
    pub detail: DetailRules,
    pub listing_columns: &'static [&'static str],
    pub detail_columns: &'static [&'static str],
}

impl SiteProfile {
    /// Absolutize a card href against the site root.
    pub fn absolutize(&self, href: &str) -> String {
        match self.link_base {
            Some(base) if href.starts_with('/') => format!("{}{}", base, href),
            _ => href.to_string(),
        }
    }
}

pub fn all() -> &'static [&'static SiteProfile] {
    static PROFILES: &[&SiteProfile] = &[
        &avito::PROFILE,
        &auto24::PROFILE,
        &moteur::PROFILE,
        &wandaloo::PROFILE,
    ];
    PROFILES
}

pub fn by_name(name: &str) -> Option<&'static SiteProfile> {
    all()
        .iter()
        .copied()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_substitutes_one_based_pages() {
        let p = Pagination::PageQuery {
            template: "https://example.ma/cars?o={page}",
            start: 1,
        };
        assert_eq!(p.page_url(0).unwrap(), "https://example.ma/cars?o=1");
        assert_eq!(p.page_url(2).unwrap(), "https://example.ma/cars?o=3");
    }

    #[test]
    fn offset_pagination_appends_increments() {
        let p = Pagination::Offset {
            base: "https://example.ma/occasion/",
            step: 30,
        };
        assert_eq!(p.page_url(0).unwrap(), "https://example.ma/occasion/");
        assert_eq!(p.page_url(1).unwrap(), "https://example.ma/occasion/30");
        assert_eq!(p.page_url(3).unwrap(), "https://example.ma/occasion/90");
    }

    #[test]
    fn infinite_scroll_is_a_single_page() {
        let p = Pagination::InfiniteScroll {
            url: "https://example.ma/buy",
            max_scrolls: 5,
        };
        assert_eq!(p.page_url(0).unwrap(), "https://example.ma/buy");
        assert_eq!(p.page_url(1), None);
    }

    #[test]
    fn every_profile_resolves_by_name() {
        for profile in all() {
            assert!(by_name(profile.name).is_some());
        }
        assert!(by_name("AVITO").is_some());
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn profiles_keep_id_and_link_columns() {
        for profile in all() {
            assert!(profile.listing_columns.contains(&"ID"));
            assert!(profile.listing_columns.contains(&"URL de l'annonce"));
            assert!(profile.detail_columns.contains(&"ID"));
        }
    }
}
