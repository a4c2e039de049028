//! Content postprocessing: post ordering, adjacent-post links, taxonomy
//! aggregation.

use crate::site::{ItemKind, SiteContext, TermEntry};

pub(crate) fn postprocess(ctx: &mut SiteContext) {
    sort_posts(ctx);
    link_neighbors(ctx);
    aggregate_taxonomies(ctx);
}

/// Newest first; same-day posts order by source path for determinism.
fn sort_posts(ctx: &mut SiteContext) {
    ctx.posts.sort_by(|a, b| {
        let (da, db) = (a.date(), b.date());
        db.cmp(&da).then_with(|| a.source.cmp(&b.source))
    });
}

/// Wire previous/next indices through the sorted posts list.
///
/// `previous` points to the next-older post (higher index), `next` to the
/// next-newer one.
fn link_neighbors(ctx: &mut SiteContext) {
    let len = ctx.posts.len();
    for (i, item) in ctx.posts.iter_mut().enumerate() {
        if let ItemKind::Post(data) = &mut item.kind {
            data.previous = (i + 1 < len).then_some(i + 1);
            data.next = i.checked_sub(1);
        }
    }
}

/// Group posts by term for every configured taxonomy.
///
/// Terms are case-folded for grouping; the display name keeps the casing
/// of the first occurrence. Blank terms are dropped.
fn aggregate_taxonomies(ctx: &mut SiteContext) {
    let taxonomy_names: Vec<String> = ctx.config.taxonomies.keys().cloned().collect();

    for taxonomy in taxonomy_names {
        let mut terms: std::collections::BTreeMap<String, TermEntry> = Default::default();
        for (index, post) in ctx.posts.iter().enumerate() {
            let values = match taxonomy.as_str() {
                "categories" => &post.meta.categories,
                "tags" => &post.meta.tags,
                custom => {
                    // custom taxonomies read from frontmatter extras
                    match post.meta.extra.get(custom).and_then(|v| v.as_array()) {
                        Some(array) => {
                            for value in array.iter().filter_map(|v| v.as_str()) {
                                insert_term(&mut terms, value, index);
                            }
                            continue;
                        }
                        None => continue,
                    }
                }
            };
            for value in values {
                insert_term(&mut terms, value, index);
            }
        }
        ctx.taxonomies.insert(taxonomy, terms);
    }
}

fn insert_term(
    terms: &mut std::collections::BTreeMap<String, TermEntry>,
    raw: &str,
    post_index: usize,
) {
    let display = raw.trim();
    if display.is_empty() {
        return;
    }
    let key = display.to_lowercase();
    terms
        .entry(key)
        .or_insert_with(|| TermEntry {
            name: display.to_string(),
            posts: Vec::new(),
        })
        .posts
        .push(post_index);
}
