pub mod images;

pub use images::{extension_for, FetchedImage, HttpImageFetcher, ImageFetcher};

use anyhow::Result;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::extract;
use crate::fetch::{BrowserSession, FetchError};
use crate::models::{ListingDetail, NOT_AVAILABLE};
use crate::politeness::Politeness;
use crate::sink::{load_listings, CsvTable, InputListing};
use crate::sites::{DetailRules, SiteProfile};

/// Seam between the enrichment pipeline and the page-loading machinery:
/// hand back the rendered detail page for a URL, or a typed failure. The
/// browser implementation waits for the detail container and clicks any
/// reveal toggles before capturing.
pub trait DetailPageSource {
    fn open_detail(&mut self, url: &str, rules: &DetailRules) -> Result<String, FetchError>;
}

impl DetailPageSource for BrowserSession {
    fn open_detail(&mut self, url: &str, rules: &DetailRules) -> Result<String, FetchError> {
        self.load(url)?;
        self.wait_for_default(rules.container)?;
        for text in rules.reveal_text {
            let _ = self.click_button_with_text(text);
        }
        for selector in rules.reveal_css {
            let _ = self.click_all_js(selector);
        }
        if rules.scroll_before_extract {
            self.scroll_to_bottom()?;
        }
        self.snapshot_html()
    }
}

fn match_label(label: &str, rules: &DetailRules) -> Option<crate::sites::DetailField> {
    let label = label.to_lowercase();
    rules
        .labels
        .iter()
        .find(|(pattern, _)| label.contains(&pattern.to_lowercase()))
        .map(|(_, field)| *field)
}

/// Project a captured detail page onto a typed record. Labels outside the
/// profile vocabulary are ignored; misses stay at the sentinel.
pub fn detail_from_document(
    doc: &Html,
    rules: &DetailRules,
    input: &InputListing,
) -> ListingDetail {
    let mut detail = ListingDetail::sentinel(&input.id, &input.image_folder);
    let root = doc.root_element();

    for (field, probe) in rules.extra_probes {
        if let Some(value) = extract::probe(root, probe) {
            field.apply(&mut detail, value);
        }
    }

    if let Ok(row_sel) = Selector::parse(rules.spec_row) {
        for row in doc.select(&row_sel) {
            let Some(label) = extract::probe(row, &rules.spec_label) else {
                continue;
            };
            let Some(value) = extract::probe(row, &rules.spec_value) else {
                continue;
            };
            if let Some(field) = match_label(&label, rules) {
                field.apply(&mut detail, value);
            } else {
                debug!("Ignoring unrecognized label `{}`", label);
            }
        }
    }

    if let Some(selector) = rules.equipment {
        detail.equipment = extract::all_texts(root, selector);
    }

    if rules.split_brand_from_title && detail.brand == NOT_AVAILABLE {
        let mut words = input.title.split_whitespace();
        if let Some(first) = words.next() {
            detail.brand = first.to_string();
            let rest = words.collect::<Vec<_>>().join(" ");
            if !rest.is_empty() {
                detail.model = rest;
            }
        }
    }

    detail
}

/// Gallery URLs in page order: rewritten to full resolution when the
/// profile knows the thumbnail convention, de-duplicated, non-http entries
/// dropped.
pub fn gallery_urls(doc: &Html, rules: &DetailRules) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    extract::all_attrs(doc.root_element(), rules.gallery, rules.gallery_attr)
        .into_iter()
        .filter(|url| url.starts_with("http"))
        .filter(|url| {
            if !rules.image_ext_only {
                return true;
            }
            let lower = url.to_lowercase();
            lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
        })
        .map(|url| match rules.thumb_rewrite {
            Some((from, to)) => url.replace(from, to),
            None => url,
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Visits each summary's detail page, extracts the extended fields and
/// downloads the gallery into the listing's folder.
pub struct DetailEnricher<'a, S, F> {
    source: &'a mut S,
    images: &'a F,
    profile: &'static SiteProfile,
    images_root: PathBuf,
}

impl<'a, S: DetailPageSource, F: ImageFetcher> DetailEnricher<'a, S, F> {
    pub fn new(
        source: &'a mut S,
        images: &'a F,
        profile: &'static SiteProfile,
        data_root: &Path,
    ) -> Self {
        let images_root = data_root.join(profile.name).join("images");
        Self {
            source,
            images,
            profile,
            images_root,
        }
    }

    /// Enrich one listing. Never fails the run: a page that cannot be
    /// opened, or never renders its detail container, yields a record with
    /// sentinel fields.
    pub async fn enrich(&mut self, input: &InputListing) -> ListingDetail {
        let html = match self.source.open_detail(&input.link, &self.profile.detail) {
            Ok(html) => html,
            Err(e) => {
                warn!("Listing {}: detail page unusable ({})", input.id, e);
                return ListingDetail::sentinel(&input.id, &input.image_folder);
            }
        };

        // Parse inside a block: the DOM must be gone before the first await.
        let (mut detail, urls) = {
            let doc = Html::parse_document(&html);
            (
                detail_from_document(&doc, &self.profile.detail, input),
                gallery_urls(&doc, &self.profile.detail),
            )
        };

        detail.image_paths = self.download_gallery(&urls, &input.image_folder).await;
        detail
    }

    /// Download sequentially; one bad image is logged and skipped. The
    /// listing folder is created even when the gallery is empty.
    async fn download_gallery(&self, urls: &[String], folder: &str) -> Vec<String> {
        let dir = self.images_root.join(folder);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Cannot create {}: {}", dir.display(), e);
            return Vec::new();
        }

        let mut saved = Vec::new();
        for (index, url) in urls.iter().enumerate() {
            match self.images.fetch_image(url).await {
                Ok(image) => {
                    let ext = extension_for(url, image.content_type.as_deref());
                    let file_name = format!("image_{}.{}", index + 1, ext);
                    let path = dir.join(&file_name);
                    match tokio::fs::write(&path, &image.bytes).await {
                        Ok(()) => {
                            debug!("Downloaded image {}/{} for {}", index + 1, urls.len(), folder);
                            saved.push(format!("{}/{}", folder, file_name));
                        }
                        Err(e) => warn!("Cannot write {}: {}", path.display(), e),
                    }
                }
                Err(e) => warn!("Image {} skipped: {}", url, e),
            }
        }
        saved
    }
}

fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value == NOT_AVAILABLE
}

/// Overlay detail pairs onto the summary row. A real detail value replaces
/// the summary's; a sentinel never clobbers something real.
pub fn merge_rows(
    base: &[(String, String)],
    overlay: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = base.to_vec();
    for (column, value) in overlay {
        match merged.iter_mut().find(|(c, _)| c == column) {
            Some((_, existing)) => {
                if !is_placeholder(value) || is_placeholder(existing) {
                    *existing = value.clone();
                }
            }
            None => merged.push((column.clone(), value.clone())),
        }
    }
    merged
}

/// The summary side of a merged details row: the source row as-is, with the
/// resolved id and folder pinned on top (they may have been derived).
fn input_row(input: &InputListing) -> Vec<(String, String)> {
    let mut row = input.raw.clone();
    row.push(("ID".to_string(), input.id.clone()));
    row.push(("URL de l'annonce".to_string(), input.link.clone()));
    row.push(("Dossier d'images".to_string(), input.image_folder.clone()));
    row
}

/// Outcome of one enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichReport {
    pub rows_written: usize,
    pub skipped_seen: usize,
    pub images_downloaded: usize,
}

pub fn details_path(data_root: &Path, profile: &SiteProfile) -> PathBuf {
    data_root
        .join(profile.name)
        .join(format!("{}_details.csv", profile.name))
}

/// Enrich every listing of an input table into the site's details table.
///
/// The table is opened in append mode and ids already present are skipped,
/// so an interrupted run resumes where it stopped without duplicating rows.
pub async fn run<S: DetailPageSource, F: ImageFetcher>(
    source: &mut S,
    images: &F,
    profile: &'static SiteProfile,
    input_path: &Path,
    data_root: &Path,
    politeness: Politeness,
) -> Result<EnrichReport> {
    let listings = load_listings(input_path)?;
    let table = CsvTable::new(
        details_path(data_root, profile),
        profile.detail_columns,
        profile.csv_delimiter,
    );
    let seen = table.seen_ids("ID")?;
    let mut appender = table.appender()?;
    let mut enricher = DetailEnricher::new(source, images, profile, data_root);

    let mut report = EnrichReport::default();
    let total = listings.len();
    for (index, listing) in listings.iter().enumerate() {
        if seen.contains(&listing.id) {
            debug!("Listing {} already enriched, skipping", listing.id);
            report.skipped_seen += 1;
            continue;
        }
        if report.rows_written > 0 {
            politeness.pause().await;
        }
        info!("Processing listing {}/{}: {}", index + 1, total, listing.link);

        let detail = enricher.enrich(listing).await;
        report.images_downloaded += detail.image_paths.len();

        let merged = merge_rows(&input_row(listing), &detail.to_row());
        appender.write_row(&merged)?;
        report.rows_written += 1;
    }

    info!(
        "Enrichment finished: {} rows written, {} already present, {} images",
        report.rows_written, report.skipped_seen, report.images_downloaded
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;

    fn input() -> InputListing {
        InputListing {
            id: "3".to_string(),
            title: "Dacia Logan 1.5".to_string(),
            price: "75 000 DH".to_string(),
            published: "2025-03-01".to_string(),
            link: "https://www.avito.ma/fr/annonce/3.htm".to_string(),
            image_folder: "3_Dacia_Logan_1_5".to_string(),
            raw: vec![
                ("ID".to_string(), "3".to_string()),
                ("Titre".to_string(), "Dacia Logan 1.5".to_string()),
            ],
        }
    }

    const AVITO_DETAIL: &str = r#"
        <div class="sc-qmn92k-0 cjptpz">
          <ul>
            <li><span class="sc-1x0vz2r-0 jZyObG">Kilométrage</span>
                <span class="sc-1x0vz2r-0 gSLYtF">140 000 - 149 999</span></li>
            <li><span class="sc-1x0vz2r-0 jZyObG">Marque</span>
                <span class="sc-1x0vz2r-0 gSLYtF">Dacia</span></li>
            <li><span class="sc-1x0vz2r-0 jZyObG">puissance fiscale</span>
                <span class="sc-1x0vz2r-0 gSLYtF">6 CV</span></li>
            <li><span class="sc-1x0vz2r-0 jZyObG">Couleur</span>
                <span class="sc-1x0vz2r-0 gSLYtF">Gris</span></li>
          </ul>
        </div>
        <div class="sc-1g3sn3w-15 evEiLa">
          <span class="sc-1x0vz2r-0 bXFCIH">Climatisation</span>
          <span class="sc-1x0vz2r-0 bXFCIH">ABS</span>
        </div>
        <div class="sc-1g3sn3w-7 bNWHpB">
          <span class="sc-1x0vz2r-0 iotEHk">Casablanca</span>
        </div>
        <div class="picture"><img class="sc-1gjavk-0" src="https://img.avito.ma/1.jpg"></div>
        <div class="picture"><img class="sc-1gjavk-0" src="https://img.avito.ma/2.jpg"></div>
    "#;

    #[test]
    fn labels_project_onto_typed_fields() {
        let doc = Html::parse_document(AVITO_DETAIL);
        let detail = detail_from_document(&doc, &sites::avito::PROFILE.detail, &input());

        assert_eq!(detail.mileage, "140 000 - 149 999");
        assert_eq!(detail.brand, "Dacia");
        assert_eq!(detail.seller_city, "Casablanca");
        assert_eq!(detail.equipment, vec!["Climatisation", "ABS"]);
    }

    #[test]
    fn label_matching_is_case_insensitive() {
        let doc = Html::parse_document(AVITO_DETAIL);
        let detail = detail_from_document(&doc, &sites::avito::PROFILE.detail, &input());
        assert_eq!(detail.fiscal_power, "6 CV");
    }

    #[test]
    fn unrecognized_labels_are_ignored_and_misses_stay_sentinel() {
        let doc = Html::parse_document(AVITO_DETAIL);
        let detail = detail_from_document(&doc, &sites::avito::PROFILE.detail, &input());
        // `Couleur` is not in the vocabulary and nothing else fills these.
        assert_eq!(detail.doors, NOT_AVAILABLE);
        assert_eq!(detail.origin, NOT_AVAILABLE);
    }

    #[test]
    fn empty_page_keeps_every_sentinel() {
        let doc = Html::parse_document("<html><body></body></html>");
        let detail = detail_from_document(&doc, &sites::avito::PROFILE.detail, &input());
        assert_eq!(detail.mileage, NOT_AVAILABLE);
        assert!(detail.equipment.is_empty());
        assert_eq!(detail.sequence_id, "3");
    }

    #[test]
    fn gallery_urls_keep_page_order_and_dedupe() {
        let doc = Html::parse_document(AVITO_DETAIL);
        let urls = gallery_urls(&doc, &sites::avito::PROFILE.detail);
        assert_eq!(
            urls,
            vec!["https://img.avito.ma/1.jpg", "https://img.avito.ma/2.jpg"]
        );
    }

    #[test]
    fn thumbnails_are_rewritten_to_full_resolution() {
        let html = r#"<div class="carousel-image">
            <img src="https://cdn.auto24.ma/medium/car1.webp">
        </div>"#;
        let doc = Html::parse_document(html);
        let urls = gallery_urls(&doc, &sites::auto24::PROFILE.detail);
        assert_eq!(urls, vec!["https://cdn.auto24.ma/car1.webp"]);
    }

    #[test]
    fn extension_filter_drops_non_image_links() {
        let html = r#"
            <div class="popup-gallery">
              <a href="https://www.wandaloo.com/img/1.jpg"><img></a>
              <a href="https://www.wandaloo.com/fiche-technique.html"><img></a>
            </div>"#;
        let doc = Html::parse_document(html);
        let urls = gallery_urls(&doc, &sites::wandaloo::PROFILE.detail);
        assert_eq!(urls, vec!["https://www.wandaloo.com/img/1.jpg"]);
    }

    #[test]
    fn title_split_fills_brand_and_model() {
        let doc = Html::parse_document("<html><body></body></html>");
        let detail = detail_from_document(&doc, &sites::wandaloo::PROFILE.detail, &input());
        assert_eq!(detail.brand, "Dacia");
        assert_eq!(detail.model, "Logan 1.5");
    }

    #[test]
    fn merge_prefers_real_values_over_sentinels() {
        let base = vec![
            ("Prix".to_string(), "75 000 DH".to_string()),
            ("Année".to_string(), "2019".to_string()),
        ];
        let overlay = vec![
            ("Année".to_string(), NOT_AVAILABLE.to_string()),
            ("Kilométrage".to_string(), "120 000".to_string()),
        ];
        let merged = merge_rows(&base, &overlay);

        let get = |col: &str| {
            merged
                .iter()
                .find(|(c, _)| c == col)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("Année"), "2019");
        assert_eq!(get("Kilométrage"), "120 000");
        assert_eq!(get("Prix"), "75 000 DH");
    }

    #[test]
    fn merge_lets_detail_override_summary() {
        let base = vec![("Date de publication".to_string(), NOT_AVAILABLE.to_string())];
        let overlay = vec![("Date de publication".to_string(), "2025-02-01".to_string())];
        let merged = merge_rows(&base, &overlay);
        assert_eq!(merged[0].1, "2025-02-01");
    }
}
