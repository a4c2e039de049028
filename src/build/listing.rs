//! Generated list pages: the paginated archive and taxonomy term pages.

use crate::log;
use crate::permalink::{destination_for_url, slugify};
use crate::site::{ContentItem, ItemKind, ListData, Metadata, Pager, SiteContext};
use std::collections::HashSet;

pub(crate) fn generate_lists(ctx: &mut SiteContext) {
    let page_size = ctx.config.build.posts_per_page;
    let mut lists = Vec::new();

    // URL uniqueness holds across the whole site, so list pages check
    // against everything discovery already claimed
    let mut seen_urls: HashSet<String> = ctx
        .posts
        .iter()
        .chain(ctx.pages.iter())
        .map(|item| item.url.clone())
        .collect();
    let mut collisions = 0;

    // main archive over all posts, which are already sorted newest-first
    let all_posts: Vec<usize> = (0..ctx.posts.len()).collect();
    let archive_base = ctx.config.permalinks.archive.clone();
    build_list_pages(
        ctx,
        &mut lists,
        &mut seen_urls,
        &mut collisions,
        &archive_base,
        None,
        None,
        &all_posts,
        page_size,
    );

    let taxonomies = ctx.taxonomies.clone();
    for (taxonomy, terms) in &taxonomies {
        let Some(base_path) = ctx.config.taxonomies.get(taxonomy).cloned() else {
            continue;
        };
        for entry in terms.values() {
            let base = format!("/{}/{}/", base_path.trim_matches('/'), slugify(&entry.name));
            build_list_pages(
                ctx,
                &mut lists,
                &mut seen_urls,
                &mut collisions,
                &base,
                Some(taxonomy.clone()),
                Some(entry.name.clone()),
                &entry.posts,
                page_size,
            );
        }
    }

    ctx.item_errors += collisions;
    log!("listing"; "{} list pages", lists.len());
    ctx.lists = lists;
}

/// Slice one post set into page-sized list items under `base`.
///
/// An empty post set produces no pages at all. A page whose URL is
/// already taken by another item is skipped and counted in `collisions`.
#[allow(clippy::too_many_arguments)]
fn build_list_pages(
    ctx: &SiteContext,
    lists: &mut Vec<ContentItem>,
    seen_urls: &mut HashSet<String>,
    collisions: &mut usize,
    base: &str,
    taxonomy: Option<String>,
    term: Option<String>,
    post_indices: &[usize],
    page_size: usize,
) {
    let slices = paginate(post_indices, page_size);
    let total_pages = slices.len();
    // the effective size of the single unlimited page is the item count
    let effective_page_size = if page_size == 0 {
        post_indices.len()
    } else {
        page_size
    };

    for (page_index, slice) in slices.into_iter().enumerate() {
        let current_page = page_index + 1;
        let url = page_url(base, current_page);
        if !seen_urls.insert(url.clone()) {
            log!("error"; "URL collision at `{url}`, skipping list page");
            *collisions += 1;
            continue;
        }
        let title = term.clone().unwrap_or_else(|| ctx.config.base.title.clone());

        let pager = Pager {
            current_page,
            total_pages,
            total_items: post_indices.len(),
            page_size: effective_page_size,
            previous_url: (current_page > 1).then(|| page_url(base, current_page - 1)),
            next_url: (current_page < total_pages).then(|| page_url(base, current_page + 1)),
            first_url: base.to_string(),
            page_url_template: format!("{base}page/:num/"),
        };

        lists.push(ContentItem {
            source: String::new(),
            dest: destination_for_url(&url),
            seo: Some(ctx.seo_for(Some(&title), None, &url)),
            url,
            meta: Metadata {
                title: Some(title),
                ..Default::default()
            },
            body: String::new(),
            kind: ItemKind::List(ListData {
                taxonomy: taxonomy.clone(),
                term: term.clone(),
                posts: slice,
                pager,
            }),
        });
    }
}

/// Split indices into page-sized chunks; `page_size == 0` means a single
/// unlimited page. No items, no pages.
fn paginate(post_indices: &[usize], page_size: usize) -> Vec<Vec<usize>> {
    if post_indices.is_empty() {
        return Vec::new();
    }
    if page_size == 0 {
        return vec![post_indices.to_vec()];
    }
    post_indices
        .chunks(page_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// URL of page `n` of a list: the base itself for page one, `page/n/`
/// below it otherwise.
fn page_url(base: &str, n: usize) -> String {
    if n == 1 {
        base.to_string()
    } else {
        format!("{base}page/{n}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::site::{PostData, TermEntry};
    use chrono::NaiveDate;

    fn posts(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem {
                source: format!("posts/p{i}.md"),
                dest: String::new(),
                url: format!("/p{i}/"),
                meta: Metadata {
                    title: Some(format!("P{i}")),
                    ..Default::default()
                },
                body: String::new(),
                seo: None,
                kind: ItemKind::Post(PostData {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                    reading_time: 1,
                    summary: String::new(),
                    previous: None,
                    next: None,
                }),
            })
            .collect()
    }

    fn context(post_count: usize, page_size: usize) -> SiteContext {
        let mut config = SiteConfig::default();
        config.build.posts_per_page = page_size;
        config.base.title = "Site".to_string();
        let mut ctx = SiteContext::new(config);
        ctx.posts = posts(post_count);
        ctx
    }

    #[test]
    fn test_archive_pagination() {
        let mut ctx = context(5, 2);
        generate_lists(&mut ctx);

        assert_eq!(ctx.lists.len(), 3);
        assert_eq!(ctx.lists[0].url, "/blog/");
        assert_eq!(ctx.lists[1].url, "/blog/page/2/");
        assert_eq!(ctx.lists[2].url, "/blog/page/3/");
        assert_eq!(ctx.lists[2].dest, "blog/page/3/index.html");

        let first = ctx.lists[0].list().unwrap();
        assert_eq!(first.posts, vec![0, 1]);
        assert_eq!(first.pager.total_pages, 3);
        assert_eq!(first.pager.previous_url, None);
        assert_eq!(first.pager.next_url.as_deref(), Some("/blog/page/2/"));

        let last = ctx.lists[2].list().unwrap();
        assert_eq!(last.posts, vec![4]);
        assert_eq!(last.pager.previous_url.as_deref(), Some("/blog/page/2/"));
        assert_eq!(last.pager.next_url, None);
    }

    #[test]
    fn test_unlimited_page_size() {
        let mut ctx = context(5, 0);
        generate_lists(&mut ctx);

        assert_eq!(ctx.lists.len(), 1);
        let list = ctx.lists[0].list().unwrap();
        assert_eq!(list.posts.len(), 5);
        // the pager reports the effective size, never a zero page size
        assert_eq!(list.pager.page_size, 5);
        assert_eq!(list.pager.total_items, 5);
    }

    #[test]
    fn test_list_page_url_collision_skipped() {
        let mut ctx = context(1, 10);
        ctx.pages.push(ContentItem {
            source: "blog.md".to_string(),
            dest: "blog/index.html".to_string(),
            url: "/blog/".to_string(),
            meta: Metadata {
                title: Some("Blog".to_string()),
                ..Default::default()
            },
            body: String::new(),
            seo: None,
            kind: ItemKind::Page,
        });
        generate_lists(&mut ctx);

        assert!(ctx.lists.iter().all(|l| l.url != "/blog/"));
        assert_eq!(ctx.item_errors, 1);
    }

    #[test]
    fn test_no_posts_no_pages() {
        let mut ctx = context(0, 10);
        generate_lists(&mut ctx);
        assert!(ctx.lists.is_empty());
    }

    #[test]
    fn test_taxonomy_term_pages() {
        let mut ctx = context(3, 10);
        ctx.taxonomies.insert(
            "tags".to_string(),
            std::collections::BTreeMap::from([(
                "rust lang".to_string(),
                TermEntry {
                    name: "Rust Lang".to_string(),
                    posts: vec![0, 2],
                },
            )]),
        );
        generate_lists(&mut ctx);

        let term_page = ctx
            .lists
            .iter()
            .find(|l| l.list().unwrap().term.is_some())
            .unwrap();
        assert_eq!(term_page.url, "/tags/rust-lang/");
        assert_eq!(term_page.meta.title.as_deref(), Some("Rust Lang"));
        assert_eq!(term_page.list().unwrap().posts, vec![0, 2]);
        assert_eq!(
            term_page.list().unwrap().taxonomy.as_deref(),
            Some("tags")
        );
    }

    #[test]
    fn test_unconfigured_taxonomy_not_listed() {
        let mut ctx = context(1, 10);
        ctx.taxonomies.insert(
            "series".to_string(),
            std::collections::BTreeMap::from([(
                "a".to_string(),
                TermEntry {
                    name: "a".to_string(),
                    posts: vec![0],
                },
            )]),
        );
        generate_lists(&mut ctx);

        assert!(ctx
            .lists
            .iter()
            .all(|l| l.list().unwrap().taxonomy.as_deref() != Some("series")));
    }

    #[test]
    fn test_archive_title_falls_back_to_site() {
        let mut ctx = context(1, 10);
        generate_lists(&mut ctx);
        assert_eq!(ctx.lists[0].meta.title.as_deref(), Some("Site"));
    }
}
