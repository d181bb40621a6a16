//! End-to-end enrichment over canned pages: a full pass against an input
//! table with an unreachable listing, a two-image listing and an
//! image-less listing, plus the resume behavior across a second pass.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use autosouk::enrich::{self, DetailPageSource, FetchedImage, ImageFetcher};
use autosouk::fetch::FetchError;
use autosouk::politeness::Politeness;
use autosouk::sites;
use autosouk::sites::DetailRules;

struct FakeSource {
    pages: HashMap<String, String>,
}

impl DetailPageSource for FakeSource {
    fn open_detail(&mut self, url: &str, rules: &DetailRules) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::WaitTimeout {
                selector: rules.container.to_string(),
                waited: Duration::from_secs(10),
            })
    }
}

struct FakeFetcher {
    images: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError> {
        match self.images.get(url) {
            Some(bytes) => Ok(FetchedImage {
                bytes: bytes.clone(),
                content_type: Some("image/jpeg".to_string()),
            }),
            None => Err(FetchError::BadStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

const URL_DEAD: &str = "https://www.avito.ma/fr/annonce/1.htm";
const URL_TWO_IMAGES: &str = "https://www.avito.ma/fr/annonce/2.htm";
const URL_NO_IMAGES: &str = "https://www.avito.ma/fr/annonce/3.htm";

fn detail_page(images: &[&str]) -> String {
    let gallery: String = images
        .iter()
        .map(|src| format!(r#"<div class="picture"><img class="sc-1gjavk-0" src="{src}"></div>"#))
        .collect();
    format!(
        r#"<html><body>
        <div class="sc-qmn92k-0 cjptpz"><ul>
          <li><span class="sc-1x0vz2r-0 jZyObG">Kilométrage</span>
              <span class="sc-1x0vz2r-0 gSLYtF">120 000</span></li>
          <li><span class="sc-1x0vz2r-0 jZyObG">Marque</span>
              <span class="sc-1x0vz2r-0 gSLYtF">Renault</span></li>
        </ul></div>
        {gallery}
        </body></html>"#
    )
}

fn write_input(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("avito_listings.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "ID,Titre,Prix,Date de publication,URL de l'annonce,Dossier d'images").unwrap();
    writeln!(file, "1,Clio morte,50 000 DH,2025-03-01,{URL_DEAD},1_Clio_morte").unwrap();
    writeln!(file, "2,Megane,90 000 DH,2025-03-02,{URL_TWO_IMAGES},2_Megane").unwrap();
    writeln!(file, "3,Kangoo,60 000 DH,2025-03-03,{URL_NO_IMAGES},3_Kangoo").unwrap();
    path
}

fn fake_world() -> (FakeSource, FakeFetcher) {
    let mut pages = HashMap::new();
    pages.insert(
        URL_TWO_IMAGES.to_string(),
        detail_page(&["https://img.avito.ma/a.jpg", "https://img.avito.ma/b.jpg"]),
    );
    pages.insert(URL_NO_IMAGES.to_string(), detail_page(&[]));

    let mut images = HashMap::new();
    images.insert("https://img.avito.ma/a.jpg".to_string(), b"jpeg-a".to_vec());
    images.insert("https://img.avito.ma/b.jpg".to_string(), b"jpeg-b".to_vec());

    (FakeSource { pages }, FakeFetcher { images })
}

fn read_details(data_root: &Path) -> Vec<HashMap<String, String>> {
    let path = data_root.join("avito").join("avito_details.csv");
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn full_pass_writes_one_row_per_listing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let data_root = dir.path().join("data");
    let (mut source, fetcher) = fake_world();

    let report = enrich::run(
        &mut source,
        &fetcher,
        &sites::avito::PROFILE,
        &input,
        &data_root,
        Politeness::none(),
    )
    .await
    .unwrap();

    assert_eq!(report.rows_written, 3);
    assert_eq!(report.images_downloaded, 2);

    let rows = read_details(&data_root);
    assert_eq!(rows.len(), 3);

    // The unreachable listing degrades to sentinels but keeps its inputs.
    let dead = rows.iter().find(|r| r["ID"] == "1").unwrap();
    assert_eq!(dead["Kilométrage"], "N/A");
    assert_eq!(dead["Marque"], "N/A");
    assert_eq!(dead["Titre"], "Clio morte");
    assert_eq!(dead["Nombre d'images"], "0");

    let rich = rows.iter().find(|r| r["ID"] == "2").unwrap();
    assert_eq!(rich["Kilométrage"], "120 000");
    assert_eq!(rich["Marque"], "Renault");
    assert_eq!(rich["Nombre d'images"], "2");

    // Two images for the second listing, with deterministic names.
    let images_root = data_root.join("avito").join("images");
    let two = images_root.join("2_Megane");
    let mut files: Vec<_> = std::fs::read_dir(&two)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();
    assert_eq!(files, vec!["image_1.jpg", "image_2.jpg"]);
    assert_eq!(std::fs::read(two.join("image_1.jpg")).unwrap(), b"jpeg-a");

    // The image-less listing still gets its (empty) folder.
    let none = images_root.join("3_Kangoo");
    assert!(none.is_dir());
    assert_eq!(std::fs::read_dir(&none).unwrap().count(), 0);
}

#[tokio::test]
async fn second_pass_skips_already_enriched_ids() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let data_root = dir.path().join("data");

    let (mut source, fetcher) = fake_world();
    enrich::run(
        &mut source,
        &fetcher,
        &sites::avito::PROFILE,
        &input,
        &data_root,
        Politeness::none(),
    )
    .await
    .unwrap();

    let (mut source, fetcher) = fake_world();
    let second = enrich::run(
        &mut source,
        &fetcher,
        &sites::avito::PROFILE,
        &input,
        &data_root,
        Politeness::none(),
    )
    .await
    .unwrap();

    assert_eq!(second.rows_written, 0);
    assert_eq!(second.skipped_seen, 3);
    assert_eq!(read_details(&data_root).len(), 3);
}

#[tokio::test]
async fn partial_gallery_failures_keep_the_remaining_images() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let data_root = dir.path().join("data");

    let (mut source, mut fetcher) = fake_world();
    // First image now 404s; the second must still land on disk.
    fetcher.images.remove("https://img.avito.ma/a.jpg");

    let report = enrich::run(
        &mut source,
        &fetcher,
        &sites::avito::PROFILE,
        &input,
        &data_root,
        Politeness::none(),
    )
    .await
    .unwrap();

    assert_eq!(report.rows_written, 3);
    assert_eq!(report.images_downloaded, 1);

    let two = data_root.join("avito").join("images").join("2_Megane");
    let files: Vec<_> = std::fs::read_dir(&two)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files, vec!["image_2.jpg"]);
}
