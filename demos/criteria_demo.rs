//! # Criteria Demo
//!
//! Walks through the main QuerySmith features:
//! - Declaring criteria with the `#[criteria]` macro
//! - Optional filters, joins and extra selects
//! - Paging read from a JSON request body
//! - Count queries over the same criteria

use querysmith::prelude::*;

/// Order search as a web handler would receive it
#[criteria]
#[table(name = "Orders")]
pub struct OrderCriteria {
    #[base]
    pub base: CriteriaBase,

    /// Exact match on the customer
    #[filter]
    pub customer_id: Option<i64>,

    /// Orders placed on or after this date
    #[filter(compare = GtEq, column = "PlacedAt")]
    pub placed_from: Option<String>,

    /// Partial match on the reference number
    #[filter(compare = Like, format = formatters::like_starts_with)]
    pub reference: Option<String>,

    /// Only orders in one of these states
    #[filter(compare = In, column = "State")]
    pub states: Option<Vec<String>>,

    #[join(kind = Left, table = "Customers", field = "Id", current_field = "CustomerId",
        including = "with_customer_names")]
    pub with_customer: bool,

    #[add_select(columns = "Customers:Id,Name")]
    pub with_customer_names: bool,

    #[many_to_many(kind = Left, table = "Products", field = "Id", current_field = "Id",
        bridge = "OrderLines", bridge_current_field = "OrderId", bridge_joined_field = "ProductId")]
    pub with_products: bool,
}

fn print_query(title: &str, query: &Query) -> anyhow::Result<()> {
    println!("\n{}", title);
    println!("{}", "-".repeat(title.len()));
    println!("sql:        {}", query.sql.split_whitespace().collect::<Vec<_>>().join(" "));
    println!("parameters: {}", serde_json::to_string(&query.parameters)?);
    println!("split_on:   {}", query.split_on);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("QuerySmith Criteria Demo");
    println!("========================");

    let smith = QuerySmith::load()?;

    // 1. No filters set: only the primary table and one splitter per join
    print_query("Empty criteria", &smith.build(&OrderCriteria::default())?)?;

    // 2. Filters and an active join
    let criteria = OrderCriteria {
        customer_id: Some(42),
        reference: Some("INV-".to_string()),
        states: Some(vec!["Paid".to_string(), "Shipped".to_string()]),
        with_customer: true,
        with_customer_names: true,
        ..Default::default()
    };
    print_query("Filtered with customer", &smith.build(&criteria)?)?;

    // 3. Paging arrives as JSON alongside the filter values
    let base: CriteriaBase = serde_json::from_str(
        r#"{ "query_type": "Paginate", "skip": 20, "take": 10, "order": [["Orders.PlacedAt", "Desc"]] }"#,
    )?;
    let criteria = OrderCriteria {
        base,
        placed_from: Some("2024-01-01".to_string()),
        with_products: true,
        ..Default::default()
    };
    print_query("Second page with products", &smith.build(&criteria)?)?;

    // 4. Same filters as a count
    let criteria = OrderCriteria {
        base: CriteriaBase::new(QueryType::OnlyCount),
        ..criteria
    };
    print_query("Count", &smith.build(&criteria)?)?;

    println!("\nDone");
    Ok(())
}
