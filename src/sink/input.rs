use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::extract::folder_name;

/// One row of a previously harvested listings table, as consumed by the
/// enrichment stage. The full original row is kept so summary columns pass
/// through to the details table unchanged.
#[derive(Debug, Clone)]
pub struct InputListing {
    pub id: String,
    pub title: String,
    pub price: String,
    pub published: String,
    pub link: String,
    pub image_folder: String,
    /// Every (column, value) pair of the source row.
    pub raw: Vec<(String, String)>,
}

/// Tables written by hand or by older runs use either comma or semicolon.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;
    Ok(if first_line.contains(';') { b';' } else { b',' })
}

fn header_index(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.iter().any(|c| h.eq_ignore_ascii_case(c)))
}

/// Resolve the URL column: exact header names first, then any column whose
/// values look like URLs.
fn resolve_url_column(
    headers: &csv::StringRecord,
    records: &[csv::StringRecord],
) -> Result<usize> {
    if let Some(idx) = header_index(headers, &["URL de l'annonce", "Lien", "URL", "Link"]) {
        return Ok(idx);
    }
    for idx in 0..headers.len() {
        let has_urls = records
            .iter()
            .filter_map(|r| r.get(idx))
            .any(|v| v.starts_with("http"));
        if has_urls {
            return Ok(idx);
        }
    }
    bail!(
        "no URL column found: expected one of `URL de l'annonce`, `Lien`, `URL`, `Link`, \
         or a column containing http links (headers were: {})",
        headers.iter().collect::<Vec<_>>().join(", ")
    );
}

/// Load a listings table produced by a harvest run.
pub fn load_listings(path: &Path) -> Result<Vec<InputListing>> {
    let delimiter = sniff_delimiter(path)?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Malformed CSV in {}", path.display()))?;

    let url_idx = resolve_url_column(&headers, &records)?;
    let id_idx = header_index(&headers, &["ID"]);
    let title_idx = header_index(&headers, &["Titre", "Title"]);
    let price_idx = header_index(&headers, &["Prix", "Price"]);
    let published_idx = header_index(&headers, &["Date de publication"]);
    let folder_idx = header_index(&headers, &["Dossier d'images"]);

    let get = |record: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };

    let mut listings = Vec::with_capacity(records.len());
    for (row_number, record) in records.iter().enumerate() {
        let id = match id_idx.and_then(|i| record.get(i)) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => (row_number + 1).to_string(),
        };
        let title = get(record, title_idx);
        let image_folder = match folder_idx.and_then(|i| record.get(i)) {
            Some(folder) if !folder.is_empty() => folder.to_string(),
            // Older tables predate the folder column; derive it the same
            // way the harvester would have.
            _ => folder_name(&title, id.parse().unwrap_or(row_number as u32 + 1)),
        };
        let raw = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        listings.push(InputListing {
            id,
            title,
            price: get(record, price_idx),
            published: get(record, published_idx),
            link: get(record, Some(url_idx)),
            image_folder,
            raw,
        });
    }

    info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn comma_table_with_exact_url_header() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "listings.csv",
            "ID,Titre,Prix,URL de l'annonce,Dossier d'images\n\
             1,Clio 4,75 000 DH,https://example.ma/a/1,1_Clio_4\n",
        );
        let rows = load_listings(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[0].link, "https://example.ma/a/1");
        assert_eq!(rows[0].image_folder, "1_Clio_4");
    }

    #[test]
    fn semicolon_delimiter_is_sniffed() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "listings.csv",
            "ID;Titre;Prix;URL de l'annonce\n2;Logan;80 000;https://example.ma/a/2\n",
        );
        let rows = load_listings(&path).unwrap();
        assert_eq!(rows[0].id, "2");
        assert_eq!(rows[0].title, "Logan");
        assert_eq!(rows[0].link, "https://example.ma/a/2");
    }

    #[test]
    fn url_column_falls_back_to_value_scanning() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "listings.csv",
            "ID,Titre,Adresse web\n1,Clio,https://example.ma/a/1\n",
        );
        let rows = load_listings(&path).unwrap();
        assert_eq!(rows[0].link, "https://example.ma/a/1");
    }

    #[test]
    fn missing_url_column_is_a_descriptive_error() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "listings.csv", "ID,Titre\n1,Clio\n");
        let err = load_listings(&path).unwrap_err().to_string();
        assert!(err.contains("no URL column"));
        assert!(err.contains("Titre"));
    }

    #[test]
    fn missing_folder_column_derives_one() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "listings.csv",
            "ID,Titre,Lien\n7,Dacia Logan,https://example.ma/a/7\n",
        );
        let rows = load_listings(&path).unwrap();
        assert_eq!(rows[0].image_folder, "7_Dacia_Logan");
    }
}
