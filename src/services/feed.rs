//! Combined community feed
//!
//! The community page shows community posts and published resources as one
//! reverse-chronological stream. Both row sets are small, so the merge is done
//! in memory on every request.

use crate::models::{CommunityPost, FeedItem, FeedPage, Resource};

/// Items per community page
pub const POSTS_PER_PAGE: usize = 10;

/// Page number from the `?page=` query value; anything missing, malformed or below 1 is page 1
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Merge posts and resources into one page of the feed
///
/// Resources are normalized into the post shape, the combined list is sorted
/// newest first (the sort is stable, so posts win ties in their original
/// order) and the `[offset, offset + page_size)` window is returned. A page
/// past the end yields no items but keeps the real totals.
pub fn merge_feed(posts: Vec<CommunityPost>, resources: Vec<Resource>, page: u32, page_size: usize) -> FeedPage {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let mut items: Vec<FeedItem> = posts
        .into_iter()
        .map(FeedItem::from)
        .chain(resources.into_iter().map(FeedItem::from))
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let offset = (page as usize - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(offset).take(page_size).collect();

    FeedPage {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{at, sample_post, sample_resource};
    use crate::models::FeedItemKind;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-3")), 1);
        assert_eq!(parse_page(Some("4")), 4);
    }

    #[test]
    fn test_merge_interleaves_by_date() {
        let posts = vec![sample_post("p-new", true, at(30)), sample_post("p-old", true, at(10))];
        let resources = vec![sample_resource("r-mid", "Self-Care", true, at(20))];

        let page = merge_feed(posts, resources, 1, POSTS_PER_PAGE);
        let titles: Vec<&str> = page.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["p-new", "r-mid", "p-old"]);
        assert_eq!(page.items[1].kind, FeedItemKind::Resource);
        assert_eq!(page.items[1].link_url.as_deref(), Some("/resources#self-care"));
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_empty_feed() {
        let page = merge_feed(vec![], vec![], 1, POSTS_PER_PAGE);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_page_past_end_is_empty_not_clamped() {
        let posts = (0..12).map(|i| sample_post(&format!("p{}", i), true, at(i))).collect();
        let page = merge_feed(posts, vec![], 5, POSTS_PER_PAGE);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 5);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_second_page_has_remainder() {
        let posts = (0..7).map(|i| sample_post(&format!("p{}", i), true, at(i))).collect();
        let resources = (0..6)
            .map(|i| sample_resource(&format!("r{}", i), "Prayer & Worship", true, at(100 + i)))
            .collect();
        let page = merge_feed(posts, resources, 2, POSTS_PER_PAGE);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.items.iter().all(|i| i.kind == FeedItemKind::Community));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every page holds min(page_size, total - offset) items in non-increasing
        /// date order, and walking all pages yields each row exactly once.
        #[test]
        fn property_feed_pages_cover_everything_once(
            post_times in proptest::collection::vec(0i64..500, 0..30),
            resource_times in proptest::collection::vec(0i64..500, 0..30),
            page_size in 1usize..12,
        ) {
            let posts: Vec<_> = post_times.iter().map(|m| sample_post("p", true, at(*m))).collect();
            let resources: Vec<_> = resource_times
                .iter()
                .map(|m| sample_resource("r", "Forgiveness", true, at(*m)))
                .collect();
            let expected: HashSet<_> = posts.iter().map(|p| p.id).chain(resources.iter().map(|r| r.id)).collect();
            let total = posts.len() + resources.len();

            let first = merge_feed(posts.clone(), resources.clone(), 1, page_size);
            prop_assert_eq!(first.total, total);
            prop_assert_eq!(first.total_pages, total.div_ceil(page_size));

            let mut seen = HashSet::new();
            let mut previous = None;
            for page in 1..=(first.total_pages as u32 + 1) {
                let result = merge_feed(posts.clone(), resources.clone(), page, page_size);
                let offset = (page as usize - 1) * page_size;
                prop_assert_eq!(result.items.len(), page_size.min(total.saturating_sub(offset)));
                for item in result.items {
                    if let Some(prev) = previous {
                        prop_assert!(item.created_at <= prev);
                    }
                    previous = Some(item.created_at);
                    prop_assert!(seen.insert(item.id));
                }
            }
            prop_assert_eq!(seen, expected);
        }
    }
}
