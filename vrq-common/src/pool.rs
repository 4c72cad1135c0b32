//! Question pool building
//!
//! A question pairs a plain image with its annotated counterpart (same
//! scene, vehicle highlighted). Both collections are laid out as
//! `<root>/<group>/<file>`; the scanner turns each root into an ordered
//! listing and [`QuestionPool::build`] pairs the two listings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{Error, Result};

/// One comparison trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Plain image file name
    pub left_image_id: String,
    /// Annotated image file name
    pub right_image_id: String,
    /// Group label (plain-side directory name)
    pub group: String,
    /// Directory the annotated image was listed under
    pub annotated_group: String,
}

/// Images of one group, in listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    pub group: String,
    pub images: Vec<String>,
}

impl GroupListing {
    pub fn new(group: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            group: group.into(),
            images,
        }
    }
}

/// How plain and annotated images are matched up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    /// Zip groups by listing position, then images by position
    #[default]
    Position,
    /// Match groups by name, then images by file stem
    Stem,
}

/// Ordered set of questions a session samples from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPool {
    items: Vec<QuestionItem>,
}

impl QuestionPool {
    pub fn from_items(items: Vec<QuestionItem>) -> Self {
        Self { items }
    }

    /// Pair two listings into a pool
    ///
    /// Unmatched tails are dropped: a group present in only one listing,
    /// or the extra images of the longer side of a group.
    pub fn build(plain: &[GroupListing], annotated: &[GroupListing], mode: PairingMode) -> Self {
        let items = match mode {
            PairingMode::Position => pair_by_position(plain, annotated),
            PairingMode::Stem => pair_by_stem(plain, annotated),
        };
        Self { items }
    }

    /// Scan both image roots and build the pool
    pub fn scan(plain_root: &Path, annotated_root: &Path, mode: PairingMode) -> Result<Self> {
        let plain = scan_listing(plain_root)?;
        let annotated = scan_listing(annotated_root)?;
        let pool = Self::build(&plain, &annotated, mode);

        tracing::info!(
            "Question pool built: {} questions from {} plain / {} annotated groups ({:?} pairing)",
            pool.len(),
            plain.len(),
            annotated.len(),
            mode
        );
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }
}

fn pair_by_position(plain: &[GroupListing], annotated: &[GroupListing]) -> Vec<QuestionItem> {
    plain
        .iter()
        .zip(annotated)
        .flat_map(|(p, a)| {
            p.images.iter().zip(&a.images).map(move |(left, right)| QuestionItem {
                left_image_id: left.clone(),
                right_image_id: right.clone(),
                group: p.group.clone(),
                annotated_group: a.group.clone(),
            })
        })
        .collect()
}

fn pair_by_stem(plain: &[GroupListing], annotated: &[GroupListing]) -> Vec<QuestionItem> {
    let annotated_by_group: HashMap<&str, &GroupListing> =
        annotated.iter().map(|g| (g.group.as_str(), g)).collect();

    let mut items = Vec::new();
    for p in plain {
        let Some(a) = annotated_by_group.get(p.group.as_str()) else {
            continue;
        };
        let by_stem: HashMap<&str, &String> =
            a.images.iter().map(|name| (file_stem(name), name)).collect();

        for left in &p.images {
            if let Some(right) = by_stem.get(file_stem(left)) {
                items.push(QuestionItem {
                    left_image_id: left.clone(),
                    right_image_id: (*right).clone(),
                    group: p.group.clone(),
                    annotated_group: a.group.clone(),
                });
            }
        }
    }
    items
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// List `<root>/<group>/<file>` as groups of file names
///
/// Groups and files are sorted by name so that two roots laid out the
/// same way list in the same order. Hidden entries are skipped.
pub fn scan_listing(root: &Path) -> Result<Vec<GroupListing>> {
    if !root.is_dir() {
        return Err(Error::PoolSource {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut groups = Vec::new();
    for group_dir in sorted_entries(root, |e| e.file_type().is_dir())? {
        let images = sorted_entries(&group_dir, |e| e.file_type().is_file())?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();

        let group = group_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        groups.push(GroupListing::new(group, images));
    }
    Ok(groups)
}

fn sorted_entries(
    dir: &Path,
    keep: impl Fn(&walkdir::DirEntry) -> bool,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = entry.map_err(|e| Error::PoolSource {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if keep(&entry) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(group: &str, images: &[&str]) -> GroupListing {
        GroupListing::new(group, images.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_position_pairing_zips_each_group() {
        let plain = vec![listing("car", &["a.png", "b.png"]), listing("truck", &["c.png"])];
        let annotated = vec![
            listing("car", &["a_box.png", "b_box.png"]),
            listing("truck", &["c_box.png"]),
        ];

        let pool = QuestionPool::build(&plain, &annotated, PairingMode::Position);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.items()[0].left_image_id, "a.png");
        assert_eq!(pool.items()[0].right_image_id, "a_box.png");
        assert_eq!(pool.items()[2].group, "truck");
    }

    #[test]
    fn test_position_pairing_stops_at_shorter_list() {
        let plain = vec![listing("car", &["a.png", "b.png", "c.png"]), listing("bus", &["d.png"])];
        let annotated = vec![listing("car", &["a_box.png"])];

        let pool = QuestionPool::build(&plain, &annotated, PairingMode::Position);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.items()[0].left_image_id, "a.png");
    }

    #[test]
    fn test_position_pairing_uses_plain_group_label() {
        let plain = vec![listing("car", &["a.png"])];
        let annotated = vec![listing("car_bbox", &["a.png"])];

        let pool = QuestionPool::build(&plain, &annotated, PairingMode::Position);
        assert_eq!(pool.items()[0].group, "car");
        assert_eq!(pool.items()[0].annotated_group, "car_bbox");
    }

    #[test]
    fn test_empty_listing_gives_empty_pool() {
        let plain = vec![listing("car", &["a.png"])];
        assert!(QuestionPool::build(&plain, &[], PairingMode::Position).is_empty());
        assert!(QuestionPool::build(&[], &plain, PairingMode::Position).is_empty());
    }

    #[test]
    fn test_stem_pairing_ignores_listing_order() {
        let plain = vec![listing("car", &["a.png", "b.png"]), listing("bus", &["x.jpg"])];
        let annotated = vec![
            listing("bus", &["x.png"]),
            listing("car", &["b.png", "zzz.png", "a.png"]),
        ];

        let pool = QuestionPool::build(&plain, &annotated, PairingMode::Stem);
        let pairs: Vec<(&str, &str)> = pool
            .items()
            .iter()
            .map(|q| (q.left_image_id.as_str(), q.right_image_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a.png", "a.png"), ("b.png", "b.png"), ("x.jpg", "x.png")]);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a.png"), "a");
        assert_eq!(file_stem("a.b.png"), "a.b");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_scan_listing_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for (group, file) in [("b_group", "2.png"), ("b_group", "1.png"), ("a_group", "x.png")] {
            std::fs::create_dir_all(dir.path().join(group)).unwrap();
            std::fs::write(dir.path().join(group).join(file), b"img").unwrap();
        }
        std::fs::write(dir.path().join("a_group").join(".DS_Store"), b"").unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"").unwrap();

        let groups = scan_listing(dir.path()).unwrap();
        assert_eq!(
            groups,
            vec![
                listing("a_group", &["x.png"]),
                listing("b_group", &["1.png", "2.png"]),
            ]
        );
    }

    #[test]
    fn test_scan_listing_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_listing(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::PoolSource { .. }));
    }
}
