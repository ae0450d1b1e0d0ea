//! Selector scenarios: filters, index plans, joins, ordering and pages.

use tabula_query::{
    Bracket, Condition, ConditionElement, ConditionOperator, OrderDirection, TableSelector,
};
use tabula_test::fixtures;
use tempfile::TempDir;

fn keys(result: &tabula_core::Resultset, alias: &str) -> Vec<String> {
    result
        .records(alias)
        .into_iter()
        .map(|record| record.key().to_string())
        .collect()
}

#[test]
fn test_select_price_above_without_index() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::test_select(&registry).unwrap();

    let mut selector = TableSelector::new(&registry, "testSelect", None).unwrap();
    selector
        .where_mut()
        .first_condition(
            fixtures::compare("testSelect", "price", ConditionOperator::Superior, 15).unwrap(),
        )
        .unwrap();

    let result = selector.execute().unwrap();
    assert_eq!(result.len(), 1);
    let paul = result[0].record("testSelect").unwrap();
    assert_eq!(paul.key(), "1");
    assert_eq!(paul.value("name").unwrap(), "paul".into());
}

#[test]
fn test_select_price_above_with_index() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    let table = fixtures::test_select(&registry).unwrap();
    table.add_index(&["price"]).unwrap();

    let mut selector = TableSelector::new(&registry, "testSelect", Some("t")).unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("t", "price", ConditionOperator::Superior, 15).unwrap())
        .unwrap();

    assert_eq!(keys(&selector.execute().unwrap(), "t"), vec!["1"]);
}

#[test]
fn test_index_select_on_composite_filter() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    let table = registry.create_table("product", 100).unwrap();
    table
        .add_column(tabula_core::Column::string("name", 32))
        .unwrap()
        .add_column(tabula_core::Column::int("price", 4))
        .unwrap();
    table.create().unwrap();
    table.add_index(&["name", "price"]).unwrap();
    for i in 0..20 {
        let name = if i % 2 == 0 { "john" } else { "paul" };
        table
            .set(
                Some(&format!("{i:02}")),
                tabula_core::Row::new().with("name", name).with("price", i),
            )
            .unwrap();
    }

    let mut selector = TableSelector::new(&registry, "product", Some("p")).unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("p", "name", ConditionOperator::Equal, "john").unwrap())
        .unwrap()
        .and_condition(
            fixtures::compare("p", "price", ConditionOperator::InferiorOrEqual, 10).unwrap(),
        )
        .unwrap();

    assert_eq!(
        keys(&selector.execute().unwrap(), "p"),
        vec!["00", "02", "04", "06", "08", "10"]
    );
}

#[test]
fn test_pagination_over_ordered_keys() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::numbers(&registry, 102).unwrap();

    let mut selector = TableSelector::new(&registry, "numbers", Some("n")).unwrap();
    selector
        .add_order_by("_key", "n", OrderDirection::Ascending)
        .unwrap();

    selector.paginate(1, 10).unwrap();
    let first = keys(&selector.execute().unwrap(), "n");
    let expected: Vec<String> = (0..10).map(|i| format!("{i:03}")).collect();
    assert_eq!(first, expected);

    selector.paginate(11, 10).unwrap();
    assert_eq!(keys(&selector.execute().unwrap(), "n"), vec!["100", "101"]);

    selector.paginate(12, 10).unwrap();
    assert!(selector.execute().unwrap().is_empty());
}

#[test]
fn test_pagination_counts_only_matching_rows() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::numbers(&registry, 50).unwrap();

    let mut selector = TableSelector::new(&registry, "numbers", Some("n")).unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("n", "n", ConditionOperator::SuperiorOrEqual, 40).unwrap())
        .unwrap();
    selector
        .add_order_by("n", "n", OrderDirection::Descending)
        .unwrap()
        .limit(2, 3);

    assert_eq!(keys(&selector.execute().unwrap(), "n"), vec!["047", "046", "045"]);
}

#[test]
fn test_join_fan_out() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::users_and_posts(&registry).unwrap();

    let mut selector = TableSelector::new(&registry, "user", Some("u")).unwrap();
    selector.join("u", "posts", Some("p")).unwrap();

    let result = selector.execute().unwrap();
    assert_eq!(result.len(), 3);
    let users = keys(&result, "u");
    assert_eq!(users.iter().filter(|k| *k == "1").count(), 1);
    assert_eq!(users.iter().filter(|k| *k == "2").count(), 2);

    let mut posts = keys(&result, "p");
    posts.sort();
    assert_eq!(posts, vec!["a", "b", "c"]);
}

#[test]
fn test_join_filters_on_joined_alias() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::users_and_posts(&registry).unwrap();

    let mut selector = TableSelector::new(&registry, "post", None).unwrap();
    selector.join("post", "owner", None).unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("owner", "name", ConditionOperator::Equal, "paul").unwrap())
        .unwrap();
    selector
        .add_order_by("title", "post", OrderDirection::Descending)
        .unwrap();

    let result = selector.execute().unwrap();
    assert_eq!(keys(&result, "post"), vec!["c", "b"]);
    assert_eq!(keys(&result, "owner"), vec!["2", "2"]);
}

#[test]
fn test_inner_and_left_join() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    let (user, _post) = fixtures::users_and_posts(&registry).unwrap();
    user.set(Some("3"), tabula_core::Row::new().with("name", "ringo")).unwrap();

    let mut inner = TableSelector::new(&registry, "user", Some("u")).unwrap();
    inner.join("u", "posts", Some("p")).unwrap();
    assert!(!keys(&inner.execute().unwrap(), "u").contains(&"3".to_string()));

    let mut left = TableSelector::new(&registry, "user", Some("u")).unwrap();
    left.left_join("u", "posts", Some("p")).unwrap();
    left.where_mut()
        .first_condition(
            Condition::unary(
                ConditionElement::var("_key", "p").unwrap(),
                ConditionOperator::IsNull,
            )
            .unwrap(),
        )
        .unwrap();
    let result = left.execute().unwrap();
    assert_eq!(keys(&result, "u"), vec!["3"]);
    assert!(result[0].contains_alias("p"));
    assert!(result[0].get("p").is_none());
}

#[test]
fn test_chained_joins() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::users_and_posts(&registry).unwrap();

    let mut selector = TableSelector::new(&registry, "post", Some("p")).unwrap();
    selector
        .join("p", "owner", Some("u"))
        .unwrap()
        .join("u", "posts", Some("siblings"))
        .unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("p", "_key", ConditionOperator::Equal, "b").unwrap())
        .unwrap();

    let result = selector.execute().unwrap();
    let mut siblings = keys(&result, "siblings");
    siblings.sort();
    assert_eq!(siblings, vec!["b", "c"]);
}

#[test]
fn test_mixed_bracket_where() {
    let dir = TempDir::new().unwrap();
    let registry = fixtures::registry(dir.path()).unwrap();
    fixtures::test_select(&registry).unwrap();

    // name = 'nobody' OR (price < 20 AND name LIKE 'jo%')
    let mut nested = Bracket::new();
    nested
        .first_condition(fixtures::compare("t", "price", ConditionOperator::Inferior, 20).unwrap())
        .unwrap()
        .and_condition(fixtures::compare("t", "name", ConditionOperator::Like, "jo%").unwrap())
        .unwrap();

    let mut selector = TableSelector::new(&registry, "testSelect", Some("t")).unwrap();
    selector
        .where_mut()
        .first_condition(fixtures::compare("t", "name", ConditionOperator::Equal, "nobody").unwrap())
        .unwrap()
        .or_bracket(nested)
        .unwrap();

    assert_eq!(keys(&selector.execute().unwrap(), "t"), vec!["0"]);
}
