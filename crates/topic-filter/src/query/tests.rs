use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::FilterConfig;
use crate::directory::memory::{MemoryDirectory, MemoryGuardian};
use crate::directory::{CapabilityOracle, NameResolver, TagResolution};
use crate::error::{Result, TopicFilterError};
use crate::types::{CategoryId, NotificationLevel, TagId, TopicStatus};

use super::{
    FilterContext, FilterResult, PredicateSink, SqlWhereBuilder, TagJoin, TopicFilterCompiler,
    TopicPredicate,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .with_tag("a", 1)
        .with_tag("b", 2)
        .with_tag("c", 3)
        .with_tag_alias("a-alias", 101, 1)
        .with_category("news", 10)
        .with_subcategory("tech", 11, 10)
        .with_subcategory("sports", 12, 10)
        .with_subcategory("gadgets", 13, 11)
        .with_category("staff", 20)
        .with_category("support", 30)
        .with_subcategory("tech", 31, 30)
}

fn compile_with(guardian: &MemoryGuardian, config: &FilterConfig, query: &str) -> FilterResult {
    let directory = directory();
    let context = FilterContext::new(guardian, &directory, config).at(now());
    TopicFilterCompiler::new(context).compile(query)
}

fn compile(guardian: &MemoryGuardian, query: &str) -> FilterResult {
    compile_with(guardian, &FilterConfig::default(), query)
}

fn member() -> MemoryGuardian {
    MemoryGuardian::for_actor(42)
}

fn tag_ids(ids: &[i64]) -> BTreeSet<TagId> {
    ids.iter().copied().map(TagId).collect()
}

fn category_ids(ids: &[i64]) -> BTreeSet<CategoryId> {
    ids.iter().copied().map(CategoryId).collect()
}

fn join(alias: &str, ids: &[i64]) -> TagJoin {
    TagJoin {
        alias: alias.to_string(),
        tag_ids: tag_ids(ids),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn queries_without_keywords_leave_the_collection_unfiltered() {
    for query in ["", "hello world", "order:latest foo:bar", "tags: :news"] {
        assert!(
            compile(&member(), query).is_unfiltered(),
            "query {query:?} should not filter"
        );
    }
}

#[test]
fn compiling_twice_gives_the_same_filter() {
    let query = "tags:a+b status:closed category:news in:watching -tags:c";
    assert_eq!(compile(&member(), query), compile(&member(), query));
}

#[test]
fn registered_scopes_apply_after_immediate_predicates() {
    let result = compile(&member(), "category:news status:closed in:pinned");
    assert_eq!(
        result.predicates(),
        &[
            TopicPredicate::Status {
                status: TopicStatus::Closed
            },
            TopicPredicate::ActivelyPinned { at: now() },
            TopicPredicate::CategoryIn {
                ids: category_ids(&[10, 11, 12, 13]),
            },
        ]
    );
}

#[test]
fn empty_result_absorbs_later_clauses() {
    let result = compile(
        &MemoryGuardian::anonymous(),
        "in:bookmarked status:closed category:news",
    );
    assert_eq!(result, FilterResult::Empty);
}

#[test]
fn compile_onto_keeps_the_base_chain() {
    let directory = directory();
    let config = FilterConfig::default();
    let guardian = member();
    let compiler = TopicFilterCompiler::new(FilterContext::new(&guardian, &directory, &config));

    let base = compiler.apply_status("open", None);
    let result = compiler.compile_onto(base, "status:listed");
    assert_eq!(result.predicates().len(), 2);

    assert_eq!(
        compiler.compile_onto(FilterResult::Empty, "status:listed"),
        FilterResult::Empty
    );
}

// ---------------------------------------------------------------------------
// in:
// ---------------------------------------------------------------------------

#[test]
fn pinned_uses_the_context_clock_even_for_anonymous_actors() {
    let result = compile(&MemoryGuardian::anonymous(), "in:pinned");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::ActivelyPinned { at: now() }]
    );
}

#[test]
fn reused_compiler_reads_the_clock_per_compilation() {
    let directory = directory();
    let config = FilterConfig::default();
    let guardian = MemoryGuardian::anonymous();
    let compiler = TopicFilterCompiler::new(FilterContext::new(&guardian, &directory, &config));

    for _ in 0..2 {
        std::thread::sleep(std::time::Duration::from_millis(5));
        let before = Utc::now();
        let result = compiler.compile("in:pinned");
        let after = Utc::now();
        match result.predicates() {
            [TopicPredicate::ActivelyPinned { at }] => {
                assert!(*at >= before && *at <= after, "pinned at {at} outside {before}..{after}");
            }
            other => panic!("expected one pinned predicate, got {other:?}"),
        }
    }
}

#[test]
fn bookmarked_requires_an_actor() {
    assert_eq!(
        compile(&MemoryGuardian::anonymous(), "in:bookmarked"),
        FilterResult::Empty
    );
    assert_eq!(
        compile(&member(), "in:bookmarked").predicates(),
        &[TopicPredicate::BookmarkedBy {
            actor: crate::types::ActorId(42)
        }]
    );
}

#[test]
fn repeated_level_clauses_merge_into_one_predicate() {
    let result = compile(&member(), "in:watching in:tracking");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::NotificationLevelIn {
            actor: crate::types::ActorId(42),
            levels: [NotificationLevel::Tracking, NotificationLevel::Watching]
                .into_iter()
                .collect(),
        }]
    );
}

#[test]
fn level_lists_drop_unknown_names() {
    let result = compile(&member(), "in:muted,bogus,regular");
    match result.predicates() {
        [TopicPredicate::NotificationLevelIn { levels, .. }] => {
            assert_eq!(
                levels.iter().copied().collect::<Vec<_>>(),
                vec![NotificationLevel::Muted, NotificationLevel::Regular]
            );
        }
        other => panic!("expected one level predicate, got {other:?}"),
    }

    match compile(&member(), "in:bogus").predicates() {
        [TopicPredicate::NotificationLevelIn { levels, .. }] => assert!(levels.is_empty()),
        other => panic!("expected one level predicate, got {other:?}"),
    }
}

#[test]
fn levels_require_an_actor() {
    assert_eq!(
        compile(&MemoryGuardian::anonymous(), "in:watching"),
        FilterResult::Empty
    );
}

// ---------------------------------------------------------------------------
// status:
// ---------------------------------------------------------------------------

#[test]
fn statuses_accumulate_as_conjunctions() {
    let result = compile(&member(), "status:open status:listed status:public");
    let statuses: Vec<TopicStatus> = result
        .predicates()
        .iter()
        .map(|predicate| match predicate {
            TopicPredicate::Status { status } => *status,
            other => panic!("unexpected predicate {other:?}"),
        })
        .collect();
    assert_eq!(
        statuses,
        vec![TopicStatus::Open, TopicStatus::Listed, TopicStatus::Public]
    );
}

#[test]
fn unknown_status_is_ignored() {
    assert!(compile(&member(), "status:solved").is_unfiltered());
}

#[test]
fn deleted_without_capability_is_a_no_op() {
    let result = compile(&member(), "status:deleted");
    assert!(result.is_unfiltered());
    assert!(!result.is_empty());

    let result = compile(&member().seeing_deleted(), "status:deleted");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::Status {
            status: TopicStatus::Deleted
        }]
    );
}

#[test]
fn apply_status_checks_deleted_visibility_per_category() {
    let directory = directory();
    let config = FilterConfig::default();
    let guardian = member().seeing_deleted_in(10);
    let compiler = TopicFilterCompiler::new(FilterContext::new(&guardian, &directory, &config));

    assert_eq!(
        compiler.apply_status("deleted", Some(CategoryId(10))).predicates(),
        &[TopicPredicate::Status {
            status: TopicStatus::Deleted
        }]
    );
    assert!(compiler.apply_status("deleted", None).is_unfiltered());
    assert!(compiler
        .apply_status("deleted", Some(CategoryId(20)))
        .is_unfiltered());
}

// ---------------------------------------------------------------------------
// tags:
// ---------------------------------------------------------------------------

#[test]
fn plus_list_requires_every_tag() {
    let result = compile(&member(), "tags:a+b");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::TaggedWithAll {
            joins: vec![join("tags_0", &[1]), join("tags_1", &[2])],
        }]
    );
}

#[test]
fn unresolved_tag_in_all_mode_empties_the_result() {
    assert_eq!(compile(&member(), "tags:a+missing"), FilterResult::Empty);
    assert_eq!(compile(&member(), "tags:missing"), FilterResult::Empty);
}

#[test]
fn comma_list_matches_any_resolved_tag() {
    let result = compile(&member(), "tags:a,missing");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::TaggedWithAny {
            alias: "tags_0".to_string(),
            tag_ids: tag_ids(&[1]),
        }]
    );

    assert!(compile(&member(), "tags:missing,unknown").is_unfiltered());
}

#[test]
fn excluded_single_tag_keeps_topics_without_it() {
    let result = compile(&member(), "-tags:a");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::MissingSomeTag {
            joins: vec![join("tags_0", &[1])],
        }]
    );
}

#[test]
fn excluded_comma_list_removes_topics_with_any_tag() {
    let result = compile(&member(), "-tags:a,b");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::TaggedWithNone {
            tag_ids: tag_ids(&[1, 2]),
        }]
    );
}

#[test]
fn excluded_plus_list_removes_topics_with_all_tags() {
    let result = compile(&member(), "-tags:a+b");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::MissingSomeTag {
            joins: vec![join("tags_0", &[1]), join("tags_1", &[2])],
        }]
    );
}

#[test]
fn alias_tags_match_their_target_too() {
    let result = compile(&member(), "tags:a-alias+b");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::TaggedWithAll {
            joins: vec![join("tags_0", &[1, 101]), join("tags_1", &[2])],
        }]
    );
}

#[test]
fn aliases_stay_unique_across_clauses() {
    let result = compile(&member(), "tags:a tags:b,c -tags:a+c");
    let aliases: Vec<&str> = result
        .predicates()
        .iter()
        .flat_map(|predicate| match predicate {
            TopicPredicate::TaggedWithAll { joins } | TopicPredicate::MissingSomeTag { joins } => {
                joins.iter().map(|join| join.alias.as_str()).collect::<Vec<_>>()
            }
            TopicPredicate::TaggedWithAny { alias, .. } => vec![alias.as_str()],
            _ => Vec::new(),
        })
        .collect();
    assert_eq!(aliases, vec!["tags_0", "tags_1", "tags_2", "tags_3"]);
}

#[test]
fn malformed_or_wrongly_prefixed_tag_clauses_are_skipped() {
    for query in ["tags:a+b,c", "=tags:a", "tags:a_b", "tags:a,,b"] {
        assert!(
            compile(&member(), query).is_unfiltered(),
            "query {query:?} should be skipped"
        );
    }
}

#[test]
fn disabled_tagging_ignores_tag_clauses() {
    let config = FilterConfig {
        tagging_enabled: false,
        ..FilterConfig::default()
    };
    assert!(compile_with(&member(), &config, "tags:missing").is_unfiltered());
    assert!(compile_with(&member(), &config, "tags:a+b").is_unfiltered());
}

// ---------------------------------------------------------------------------
// category:
// ---------------------------------------------------------------------------

#[test]
fn category_includes_all_descendants() {
    let result = compile(&member(), "category:news");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::CategoryIn {
            ids: category_ids(&[10, 11, 12, 13]),
        }]
    );
}

#[test]
fn exact_category_excludes_subcategories() {
    let result = compile(&member(), "=category:news");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::CategoryIn {
            ids: category_ids(&[10]),
        }]
    );
}

#[test]
fn invisible_or_unknown_categories_empty_the_result() {
    let guardian = member().hiding_category(10);
    assert_eq!(compile(&guardian, "category:news"), FilterResult::Empty);
    assert_eq!(compile(&guardian, "categories:staff,news"), FilterResult::Empty);
    assert_eq!(compile(&member(), "category:nowhere"), FilterResult::Empty);
}

#[test]
fn repeated_category_clauses_union_their_ids() {
    let result = compile(&member(), "=category:news =categories:staff status:open");
    assert_eq!(
        result.predicates(),
        &[
            TopicPredicate::Status {
                status: TopicStatus::Open
            },
            TopicPredicate::CategoryIn {
                ids: category_ids(&[10, 20]),
            },
        ]
    );
}

#[test]
fn parent_child_slugs_resolve_to_the_nested_category() {
    let result = compile(&member(), "=category:support:tech");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::CategoryIn {
            ids: category_ids(&[31]),
        }]
    );
}

#[test]
fn slugs_naming_the_same_category_still_resolve() {
    let result = compile(&member(), "=category:sports,news:sports");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::CategoryIn {
            ids: category_ids(&[12]),
        }]
    );

    let result = compile(&member(), "category:news,sports");
    assert_eq!(
        result.predicates(),
        &[TopicPredicate::CategoryIn {
            ids: category_ids(&[10, 11, 12, 13]),
        }]
    );
}

#[test]
fn wrongly_prefixed_category_clause_is_skipped() {
    assert!(compile(&member(), "-category:news").is_unfiltered());
    assert!(compile(&member(), "category:news+staff").is_unfiltered());
}

// ---------------------------------------------------------------------------
// Collaborator failures
// ---------------------------------------------------------------------------

struct FailingResolver;

impl NameResolver for FailingResolver {
    fn tag_ids_for_names(
        &self,
        _names: &[String],
        _oracle: &dyn CapabilityOracle,
    ) -> Result<Vec<TagResolution>> {
        Err(TopicFilterError::Lookup("tag service unavailable".to_string()))
    }

    fn category_ids_for_slugs(&self, _slugs: &[String]) -> Result<Vec<CategoryId>> {
        Err(TopicFilterError::Lookup("category service unavailable".to_string()))
    }

    fn subcategory_ids(&self, _id: CategoryId) -> Result<Vec<CategoryId>> {
        Err(TopicFilterError::Lookup("category service unavailable".to_string()))
    }
}

#[test]
fn failed_lookups_resolve_to_nothing() {
    let guardian = member();
    let config = FilterConfig::default();
    let compiler = TopicFilterCompiler::new(FilterContext::new(&guardian, &FailingResolver, &config));

    assert_eq!(compiler.compile("tags:a"), FilterResult::Empty);
    assert!(compiler.compile("tags:a,b").is_unfiltered());
    assert_eq!(compiler.compile("category:news"), FilterResult::Empty);
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn renders_a_mixed_query_to_sql() {
    let result = compile(&member(), "tags:a+b status:closed =category:news");
    let mut builder = SqlWhereBuilder::new();
    result.apply_to(&mut builder);
    let query = builder.to_sql();

    assert_eq!(
        query.sql,
        "SELECT topics.* FROM topics \
         INNER JOIN topic_tags tags_0 ON tags_0.topic_id = topics.id AND tags_0.tag_id IN (?) \
         INNER JOIN topic_tags tags_1 ON tags_1.topic_id = topics.id AND tags_1.tag_id IN (?) \
         WHERE topics.deleted_at IS NULL AND topics.closed AND topics.category_id IN (?)"
    );
    assert_eq!(query.params.len(), 3);
}

#[test]
fn alias_joins_select_distinct_topics() {
    let mut builder = SqlWhereBuilder::new();
    compile(&member(), "tags:a-alias+b").apply_to(&mut builder);
    assert!(builder.is_distinct());
    assert!(builder.to_sql().sql.starts_with("SELECT DISTINCT topics.*"));

    let mut builder = SqlWhereBuilder::new();
    compile(&member(), "tags:a+b").apply_to(&mut builder);
    assert!(!builder.is_distinct());
}

#[test]
fn compiler_exposes_its_context() {
    let directory = directory();
    let config = FilterConfig::default();
    let guardian = member();
    let compiler =
        TopicFilterCompiler::new(FilterContext::new(&guardian, &directory, &config).at(now()));

    assert_eq!(compiler.context().now(), now());
    assert!(compiler.context().settings().tagging_enabled());
    assert_eq!(
        compiler.context().guardian().current_actor(),
        Some(crate::types::ActorId(42))
    );
}

#[test]
fn empty_results_reach_the_sink_as_none() {
    #[derive(Default)]
    struct Recorder {
        applied: usize,
        none: bool,
    }

    impl PredicateSink for Recorder {
        fn apply(&mut self, _predicate: &TopicPredicate) {
            self.applied += 1;
        }

        fn none(&mut self) {
            self.none = true;
        }
    }

    let mut recorder = Recorder::default();
    compile(&member(), "tags:missing status:open").apply_to(&mut recorder);
    assert!(recorder.none);
    assert_eq!(recorder.applied, 0);
}
