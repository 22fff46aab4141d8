use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

const BUNDLED_CATALOG: &str = "catalog.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    /// Filter toolbar index of this season's chip.
    pub fn filter_index(self) -> u32 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    pub fn from_filter_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.filter_index() == index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Collection,
    Npc,
    TempleRequirements,
    Altar,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub max_hearts: Option<u8>,
}

impl Item {
    /// Items with no listed season are available all year.
    pub fn in_any_season(&self, seasons: &[Season]) -> bool {
        seasons.is_empty()
            || self.seasons.is_empty()
            || self.seasons.iter().any(|s| seasons.contains(s))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Offering {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub reward: String,
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub kind: CategoryKind,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub offerings: Vec<Offering>,
}

impl Category {
    pub fn has_seasonal_items(&self) -> bool {
        self.items.iter().any(|item| !item.seasons.is_empty())
    }

    pub fn is_altar(&self) -> bool {
        self.kind == CategoryKind::Altar
    }

    pub fn total_items(&self) -> usize {
        match self.kind {
            CategoryKind::Altar => self.offerings.iter().map(|o| o.items.len()).sum(),
            _ => self.items.len(),
        }
    }
}

/// A searchable thing in the catalog: a category page or an item on one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub category: usize,
    pub location: EntryLocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryLocation {
    Page,
    Item(usize),
    OfferingItem { offering: usize, item: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn bundled() -> Result<Self> {
        let file = CatalogAssets::get(BUNDLED_CATALOG)
            .with_context(|| format!("bundled {BUNDLED_CATALOG} missing"))?;
        let content = std::str::from_utf8(file.data.as_ref())
            .context("bundled catalog is not UTF-8")?;
        Self::from_json(content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(content).context("invalid catalog JSON")?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        let mut ids = HashSet::new();
        for category in &self.categories {
            if !slugs.insert(category.slug.as_str()) {
                bail!("duplicate category slug: {}", category.slug);
            }
            let offering_items = category.offerings.iter().flat_map(|o| o.items.iter());
            for item in category.items.iter().chain(offering_items) {
                if !ids.insert(item.id.as_str()) {
                    bail!("duplicate item id: {}", item.id);
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn position(&self, slug: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.slug == slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.slug.as_str())
    }

    pub fn altars(&self) -> impl Iterator<Item = (usize, &Category)> {
        self.categories
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_altar())
    }

    /// Every page and item, in catalog order, for the command palette.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();
        for (ci, category) in self.categories.iter().enumerate() {
            entries.push(CatalogEntry {
                name: category.name.clone(),
                category: ci,
                location: EntryLocation::Page,
            });
            for (ii, item) in category.items.iter().enumerate() {
                entries.push(CatalogEntry {
                    name: item.name.clone(),
                    category: ci,
                    location: EntryLocation::Item(ii),
                });
            }
            for (oi, offering) in category.offerings.iter().enumerate() {
                for (ii, item) in offering.items.iter().enumerate() {
                    entries.push(CatalogEntry {
                        name: item.name.clone(),
                        category: ci,
                        location: EntryLocation::OfferingItem {
                            offering: oi,
                            item: ii,
                        },
                    });
                }
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        // digit shortcuts address at most ten categories
        assert!(catalog.len() <= 10);
        assert!(catalog.altars().count() > 0);
        assert!(catalog.position("fish").is_some());
    }

    #[test]
    fn test_bundled_altars_have_items() {
        let catalog = Catalog::bundled().unwrap();
        for (_, altar) in catalog.altars() {
            assert!(!altar.offerings.is_empty(), "{} has no offerings", altar.slug);
            assert!(altar.items.is_empty());
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"categories": [
            {"slug": "a", "name": "A", "kind": "collection", "items": [
                {"id": "x", "name": "X"}, {"id": "x", "name": "Y"}
            ]}
        ]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate item id"));
    }

    #[test]
    fn test_season_filter_indices_round_trip() {
        for season in Season::ALL {
            assert_eq!(Season::from_filter_index(season.filter_index()), Some(season));
        }
        assert_eq!(Season::from_filter_index(10), None);
    }

    #[test]
    fn test_items_without_seasons_match_any_filter() {
        let item = Item {
            id: "quartz".to_string(),
            name: "Quartz".to_string(),
            seasons: Vec::new(),
            description: String::new(),
            max_hearts: None,
        };
        assert!(item.in_any_season(&[Season::Winter]));
        let fish = Item {
            seasons: vec![Season::Summer],
            ..item
        };
        assert!(fish.in_any_season(&[]));
        assert!(fish.in_any_season(&[Season::Summer, Season::Fall]));
        assert!(!fish.in_any_season(&[Season::Winter]));
    }

    #[test]
    fn test_entries_cover_pages_and_offering_items() {
        let catalog = Catalog::bundled().unwrap();
        let entries = catalog.entries();
        let pages = entries
            .iter()
            .filter(|e| e.location == EntryLocation::Page)
            .count();
        assert_eq!(pages, catalog.len());
        assert!(
            entries
                .iter()
                .any(|e| matches!(e.location, EntryLocation::OfferingItem { .. }))
        );
    }
}
