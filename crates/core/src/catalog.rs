//! Reference catalog used for prompt context and conversation matching.
//!
//! The catalog is injected configuration: analyzers and the prompt composer
//! receive a `Catalog` value instead of reaching for module-level globals,
//! so tests can substitute a small fixture set.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    /// Canonical lowercase brand key, the term recorded as a "mention".
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub region: String,
    pub price_yen: u32,
    pub tasting_note: String,
}

impl CatalogEntry {
    /// Case-insensitive substring match of the brand or any alias.
    pub fn mentioned_in(&self, normalized_text: &str) -> bool {
        if normalized_text.contains(&self.id) {
            return true;
        }
        self.aliases.iter().any(|alias| normalized_text.contains(&alias.to_lowercase()))
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    region_keywords: Vec<String>,
    flavor_keywords: Vec<String>,
}

impl Catalog {
    pub fn new(
        entries: Vec<CatalogEntry>,
        region_keywords: Vec<String>,
        flavor_keywords: Vec<String>,
    ) -> Self {
        Self { entries, region_keywords, flavor_keywords }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn region_keywords(&self) -> &[String] {
        &self.region_keywords
    }

    pub fn flavor_keywords(&self) -> &[String] {
        &self.flavor_keywords
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the list block embedded into the final user message.
    pub fn excerpt(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "- {} ({}, around ¥{}): {}",
                    entry.name, entry.region, entry.price_yen, entry.tasting_note
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The built-in reference set shipped with the service.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ENTRIES
            .iter()
            .map(|(id, name, aliases, region, price_yen, tasting_note)| CatalogEntry {
                id: (*id).to_string(),
                name: (*name).to_string(),
                aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
                region: (*region).to_string(),
                price_yen: *price_yen,
                tasting_note: (*tasting_note).to_string(),
            })
            .collect();

        let region_keywords = BUILTIN_REGION_KEYWORDS.iter().map(|kw| (*kw).to_string()).collect();
        let flavor_keywords = BUILTIN_FLAVOR_KEYWORDS.iter().map(|kw| (*kw).to_string()).collect();

        Self::new(entries, region_keywords, flavor_keywords)
    }
}

type BuiltinEntry = (&'static str, &'static str, &'static [&'static str], &'static str, u32, &'static str);

const BUILTIN_ENTRIES: &[BuiltinEntry] = &[
    (
        "yamazaki",
        "Yamazaki 12 Year Old",
        &["山崎"],
        "Japan",
        16_500,
        "mizunara spice, dried fruit, soft honey",
    ),
    (
        "hakushu",
        "Hakushu 12 Year Old",
        &["白州"],
        "Japan",
        15_400,
        "green apple, forest herbs, a wisp of smoke",
    ),
    (
        "hibiki",
        "Hibiki Japanese Harmony",
        &["響"],
        "Japan",
        12_100,
        "rose, lychee, rounded blended sweetness",
    ),
    (
        "yoichi",
        "Yoichi Single Malt",
        &["余市"],
        "Japan",
        8_800,
        "coal smoke, brine, firm malty backbone",
    ),
    (
        "miyagikyo",
        "Miyagikyo Single Malt",
        &["宮城峡"],
        "Japan",
        8_800,
        "sherry fruit, gentle oak, elegant and soft",
    ),
    (
        "bowmore",
        "Bowmore 12 Year Old",
        &[],
        "Islay",
        6_800,
        "balanced peat smoke, citrus, dark chocolate",
    ),
    (
        "laphroaig",
        "Laphroaig 10 Year Old",
        &[],
        "Islay",
        7_200,
        "medicinal peat, seaweed, surprising sweetness",
    ),
    (
        "ardbeg",
        "Ardbeg 10 Year Old",
        &[],
        "Islay",
        7_900,
        "intense smoke, lime, black pepper",
    ),
    (
        "lagavulin",
        "Lagavulin 16 Year Old",
        &[],
        "Islay",
        13_200,
        "rich peat, sherry depth, long dry finish",
    ),
    (
        "macallan",
        "Macallan 12 Year Old Sherry Oak",
        &[],
        "Speyside",
        14_300,
        "sherry-seasoned oak, dried fruit, ginger",
    ),
    (
        "glenfiddich",
        "Glenfiddich 12 Year Old",
        &[],
        "Speyside",
        4_900,
        "pear, fresh oak, light and approachable",
    ),
    (
        "balvenie",
        "The Balvenie 12 Year Old DoubleWood",
        &[],
        "Speyside",
        9_600,
        "honey, vanilla, sherry-layered warmth",
    ),
    (
        "talisker",
        "Talisker 10 Year Old",
        &[],
        "Isle of Skye",
        6_500,
        "maritime smoke, black pepper, sweet core",
    ),
    (
        "highland park",
        "Highland Park 12 Year Old",
        &[],
        "Orkney",
        7_400,
        "heather honey, light peat, winter spice",
    ),
    (
        "springbank",
        "Springbank 10 Year Old",
        &[],
        "Campbeltown",
        9_900,
        "oily malt, sea spray, subtle smoke",
    ),
];

const BUILTIN_REGION_KEYWORDS: &[&str] = &[
    "islay",
    "speyside",
    "highland",
    "lowland",
    "campbeltown",
    "skye",
    "orkney",
    "island",
    "japan",
    "japanese",
    "scotch",
    "scotland",
    "アイラ",
    "スペイサイド",
];

const BUILTIN_FLAVOR_KEYWORDS: &[&str] = &[
    "peat",
    "peaty",
    "smoke",
    "smoky",
    "sherry",
    "fruity",
    "fruit",
    "vanilla",
    "honey",
    "citrus",
    "chocolate",
    "caramel",
    "floral",
    "malty",
    "spicy",
    "salty",
    "maritime",
    "oak",
    "sweet",
];

#[cfg(test)]
mod tests {
    use super::Catalog;

    #[test]
    fn builtin_catalog_has_unique_ids() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<_> = catalog.entries().iter().map(|entry| entry.id.clone()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(before, ids.len(), "catalog ids must be unique");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn entry_matching_covers_brand_and_alias() {
        let catalog = Catalog::builtin();
        let yamazaki = catalog
            .entries()
            .iter()
            .find(|entry| entry.id == "yamazaki")
            .expect("builtin set contains yamazaki");

        assert!(yamazaki.mentioned_in("i liked the yamazaki 12 a lot"));
        assert!(yamazaki.mentioned_in("山崎が好きです"));
        assert!(!yamazaki.mentioned_in("something peated please"));
    }

    #[test]
    fn excerpt_renders_one_line_per_entry() {
        let catalog = Catalog::builtin();
        let excerpt = catalog.excerpt();
        assert_eq!(excerpt.lines().count(), catalog.entries().len());
        assert!(excerpt.contains("Bowmore 12 Year Old"));
    }
}
