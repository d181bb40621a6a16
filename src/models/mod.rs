use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written whenever a field cannot be extracted.
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder for a listing that does not display a price.
pub const PRICE_UNSPECIFIED: &str = "Prix non spécifié";
/// Placeholder for a publication date that cannot be normalized.
pub const DATE_UNKNOWN: &str = "Date inconnue";

/// Best-effort classification of the party behind a listing.
///
/// Derived from visual badges or text markers on the listing card, so it is
/// an annotation, not a guaranteed-correct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerKind {
    Individual,
    Professional,
}

impl SellerKind {
    /// Label used in the output tables (the sites are French-language and the
    /// historical tables already contain these values).
    pub fn label(&self) -> &'static str {
        match self {
            SellerKind::Individual => "Particulier",
            SellerKind::Professional => "Professionnel",
        }
    }
}

impl fmt::Display for SellerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a listings table: the fields visible on a search page without
/// opening the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    /// 1-based id assigned at harvest time, dense across successful listings.
    pub sequence_id: u32,
    pub title: String,
    pub price: String,
    pub published: String,
    pub link: String,
    pub seller: SellerKind,
    /// Seller display name when the card exposes one (dealer storefronts).
    pub seller_name: Option<String>,
    /// Filesystem-safe directory name derived from id + title.
    pub image_folder: String,
    /// Site-specific light fields, already keyed by output column name.
    pub extras: Vec<(String, String)>,
}

impl ListingSummary {
    /// Project the summary onto (column, value) pairs for the sink.
    pub fn to_row(&self) -> Vec<(String, String)> {
        let creator = self
            .seller_name
            .clone()
            .unwrap_or_else(|| self.seller.label().to_string());
        let mut row = vec![
            ("ID".to_string(), self.sequence_id.to_string()),
            ("Titre".to_string(), self.title.clone()),
            ("Prix".to_string(), self.price.clone()),
            ("Date de publication".to_string(), self.published.clone()),
            ("Créateur".to_string(), creator),
            ("URL de l'annonce".to_string(), self.link.clone()),
            ("Dossier d'images".to_string(), self.image_folder.clone()),
        ];
        row.extend(self.extras.iter().cloned());
        row
    }
}

/// Extended fields visible only on a listing's own page, plus the downloaded
/// image inventory. One record per summary, keyed by the same sequence id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDetail {
    pub sequence_id: String,
    pub vehicle_type: String,
    pub sector: String,
    pub mileage: String,
    pub brand: String,
    pub model: String,
    pub doors: String,
    pub origin: String,
    pub first_hand: String,
    pub fiscal_power: String,
    pub condition: String,
    pub year: String,
    pub fuel_type: String,
    pub transmission: String,
    pub seats: String,
    pub customs: String,
    pub published: String,
    pub description: String,
    pub creator: String,
    pub equipment: Vec<String>,
    pub seller_city: String,
    pub image_folder: String,
    /// Paths relative to the site images root, in download order.
    pub image_paths: Vec<String>,
}

impl ListingDetail {
    /// A record with every field at the sentinel, used when the detail page
    /// never renders its container within the timeout.
    pub fn sentinel(sequence_id: &str, image_folder: &str) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            sequence_id: sequence_id.to_string(),
            vehicle_type: na(),
            sector: na(),
            mileage: na(),
            brand: na(),
            model: na(),
            doors: na(),
            origin: na(),
            first_hand: na(),
            fiscal_power: na(),
            condition: na(),
            year: na(),
            fuel_type: na(),
            transmission: na(),
            seats: na(),
            customs: na(),
            published: na(),
            description: na(),
            creator: na(),
            equipment: Vec::new(),
            seller_city: na(),
            image_folder: image_folder.to_string(),
            image_paths: Vec::new(),
        }
    }

    /// Project the detail onto (column, value) pairs for the sink.
    pub fn to_row(&self) -> Vec<(String, String)> {
        let equipment = if self.equipment.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.equipment.join(", ")
        };
        vec![
            ("ID".to_string(), self.sequence_id.clone()),
            ("Type de véhicule".to_string(), self.vehicle_type.clone()),
            ("Secteur".to_string(), self.sector.clone()),
            ("Kilométrage".to_string(), self.mileage.clone()),
            ("Marque".to_string(), self.brand.clone()),
            ("Modèle".to_string(), self.model.clone()),
            ("Nombre de portes".to_string(), self.doors.clone()),
            ("Origine".to_string(), self.origin.clone()),
            ("Première main".to_string(), self.first_hand.clone()),
            ("Puissance fiscale".to_string(), self.fiscal_power.clone()),
            ("État".to_string(), self.condition.clone()),
            ("Année".to_string(), self.year.clone()),
            ("Type de carburant".to_string(), self.fuel_type.clone()),
            ("Transmission".to_string(), self.transmission.clone()),
            ("Places".to_string(), self.seats.clone()),
            ("Dédouané".to_string(), self.customs.clone()),
            ("Date de publication".to_string(), self.published.clone()),
            ("Description".to_string(), self.description.clone()),
            ("Créateur".to_string(), self.creator.clone()),
            ("Équipements".to_string(), equipment),
            ("Ville du vendeur".to_string(), self.seller_city.clone()),
            ("Dossier d'images".to_string(), self.image_folder.clone()),
            (
                "Nombre d'images".to_string(),
                self.image_paths.len().to_string(),
            ),
        ]
    }
}

/// One downloaded gallery image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub source_url: String,
    pub local_path: String,
    pub listing_folder: String,
}
