//! Path derivation for every artefact of a run.
//!
//! All outputs live next to the source document and are pure functions of
//! its path, so a run can be reasoned about (and cleaned up) without any
//! state beyond the filesystem:
//!
//! ```text
//! /docs/report.docx              source
//! /docs/report.pdf               pdf_path_for(source)
//! /docs/report_images/1.jpg …    image_dir_for(pdf) + page_image_path
//! /docs/scan_report.pdf          scan_pdf_path_for(pdf)
//! ```
//!
//! Names are assembled from `OsStr` pieces so non-UTF-8 stems survive intact.

use crate::error::RescanError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Extension of the page images written by the render stage.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Prefix of the final image-only PDF.
pub const SCAN_PREFIX: &str = "scan_";

fn stem_of(path: &Path) -> &OsStr {
    path.file_stem().unwrap_or_default()
}

fn sibling(path: &Path, name: OsString) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// The PDF produced from `source`: same directory, same stem, `.pdf` suffix.
pub fn pdf_path_for(source: &Path) -> PathBuf {
    source.with_extension("pdf")
}

/// The directory holding the page images of `pdf`: `<parent>/<stem>_images`.
pub fn image_dir_for(pdf: &Path) -> PathBuf {
    let mut name = stem_of(pdf).to_os_string();
    name.push("_images");
    sibling(pdf, name)
}

/// Path of the image for 1-based `page_num` inside `image_dir`.
pub fn page_image_path(image_dir: &Path, page_num: usize) -> PathBuf {
    image_dir.join(format!("{page_num}.{IMAGE_EXTENSION}"))
}

/// The final re-scanned PDF for `pdf`: `<parent>/scan_<stem>.pdf`.
pub fn scan_pdf_path_for(pdf: &Path) -> PathBuf {
    let mut name = OsString::from(SCAN_PREFIX);
    name.push(stem_of(pdf));
    name.push(".pdf");
    sibling(pdf, name)
}

/// Page number encoded in an image's file stem (`"12.jpg"` → `12`).
pub fn page_number_of(image: &Path) -> Option<usize> {
    image.file_stem()?.to_str()?.trim().parse().ok()
}

/// Sort page images in ascending numeric order of their stems.
///
/// Lexicographic order would put `10.jpg` before `2.jpg`; the list order
/// handed in is not trusted either. Any image whose stem is not a page
/// number is rejected rather than silently dropped.
pub fn sort_by_page_number(images: Vec<PathBuf>) -> Result<Vec<PathBuf>, RescanError> {
    let mut keyed = images
        .into_iter()
        .map(|path| match page_number_of(&path) {
            Some(n) => Ok((n, path)),
            None => Err(RescanError::InvalidImageName { path }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by_key(|(n, _)| *n);
    Ok(keyed.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_path_keeps_parent_and_stem() {
        let src = Path::new("/docs/reports/2222.docx");
        let pdf = pdf_path_for(src);
        assert_eq!(pdf, PathBuf::from("/docs/reports/2222.pdf"));
        assert_eq!(pdf.parent(), src.parent());
        assert_eq!(pdf.file_stem(), src.file_stem());
    }

    #[test]
    fn pdf_path_replaces_only_final_extension() {
        assert_eq!(
            pdf_path_for(Path::new("a/minutes.v2.docx")),
            PathBuf::from("a/minutes.v2.pdf")
        );
    }

    #[test]
    fn pdf_path_of_pdf_is_identity() {
        let p = Path::new("/tmp/x.pdf");
        assert_eq!(pdf_path_for(p), p);
    }

    #[test]
    fn image_dir_is_stem_images_sibling() {
        assert_eq!(
            image_dir_for(Path::new("/docs/2222.pdf")),
            PathBuf::from("/docs/2222_images")
        );
    }

    #[test]
    fn image_dir_for_bare_file_name() {
        assert_eq!(
            image_dir_for(Path::new("thesis.pdf")),
            PathBuf::from("thesis_images")
        );
    }

    #[test]
    fn page_images_are_one_based_jpgs() {
        let dir = Path::new("/docs/2222_images");
        let names: Vec<PathBuf> = (1..=3).map(|n| page_image_path(dir, n)).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/docs/2222_images/1.jpg"),
                PathBuf::from("/docs/2222_images/2.jpg"),
                PathBuf::from("/docs/2222_images/3.jpg"),
            ]
        );
    }

    #[test]
    fn scan_pdf_is_prefixed_sibling() {
        assert_eq!(
            scan_pdf_path_for(Path::new("/docs/2222.pdf")),
            PathBuf::from("/docs/scan_2222.pdf")
        );
        assert_eq!(
            scan_pdf_path_for(Path::new("notes.pdf")),
            PathBuf::from("scan_notes.pdf")
        );
    }

    #[test]
    fn page_number_parses_numeric_stems_only() {
        assert_eq!(page_number_of(Path::new("/x/7.jpg")), Some(7));
        assert_eq!(page_number_of(Path::new("010.jpg")), Some(10));
        assert_eq!(page_number_of(Path::new("cover.jpg")), None);
        assert_eq!(page_number_of(Path::new("-1.jpg")), None);
    }

    #[test]
    fn sort_is_numeric_not_lexicographic() {
        let sorted = sort_by_page_number(vec![
            PathBuf::from("10.jpg"),
            PathBuf::from("2.jpg"),
            PathBuf::from("1.jpg"),
        ])
        .unwrap();
        assert_eq!(
            sorted,
            vec![
                PathBuf::from("1.jpg"),
                PathBuf::from("2.jpg"),
                PathBuf::from("10.jpg"),
            ]
        );
    }

    #[test]
    fn sort_rejects_non_numeric_stem() {
        let err = sort_by_page_number(vec![PathBuf::from("1.jpg"), PathBuf::from("cover.jpg")])
            .unwrap_err();
        assert!(matches!(err, RescanError::InvalidImageName { .. }));
    }

    #[test]
    fn sort_of_empty_list_is_empty() {
        assert!(sort_by_page_number(Vec::new()).unwrap().is_empty());
    }
}
