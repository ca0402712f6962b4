//! Search across registered sources

use crate::source::types::{Module, Source};

/// Search matches from one source
#[derive(Debug, Clone)]
pub struct SearchGroup {
    pub source_id: String,
    pub source_name: String,
    pub modules: Vec<Module>,
}

/// Case-insensitive substring search over module names and ids.
///
/// Groups are emitted in registry order, modules in manifest order; there is
/// no ranking. An empty result is a normal outcome.
pub fn search_sources(sources: &[Source], keyword: &str) -> Vec<SearchGroup> {
    let needle = keyword.to_lowercase();

    sources
        .iter()
        .filter_map(|source| {
            let modules: Vec<Module> = source
                .data
                .iter()
                .filter(|module| matches_keyword(module, &needle))
                .cloned()
                .collect();

            if modules.is_empty() {
                None
            } else {
                Some(SearchGroup {
                    source_id: source.id.clone(),
                    source_name: source.name.clone(),
                    modules,
                })
            }
        })
        .collect()
}

fn matches_keyword(module: &Module, needle: &str) -> bool {
    module.name.to_lowercase().contains(needle) || module.id.to_lowercase().contains(needle)
}
