use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use sqlplan::analyzer::Analyzer;
use sqlplan::catalog::{Catalog, View};
use sqlplan::config::{SessionConfig, DEFAULT_DATABASE};
use sqlplan::context::Context;
use sqlplan::formatting::format_rows;
use sqlplan::plan::{AsOf, CachedResults, NodeRef, Project, ProjectAction, SubqueryAlias, UnresolvedTable, Values};
use sqlplan::row;

/// builds the session config from `name=value` arguments, e.g. `rows_cache_limit_bytes=1024`.
fn config_from_args() -> Result<SessionConfig> {
    let mut config = SessionConfig::default();
    for arg in std::env::args().skip(1) {
        config.apply_setting(&arg)?;
    }
    Ok(config)
}

// TODO: main should read plans from a file or stdin instead of building a fixed one.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = Arc::new(Catalog::new());
    let definition: NodeRef = Arc::new(SubqueryAlias::new(
        "fruit",
        Arc::new(Values::new(vec![row![1, "apple"], row![2, "pear"], row![3, "plum"]])),
    ));
    catalog.register_view(DEFAULT_DATABASE, View::new("fruit", definition))?;
    let analyzer = Analyzer::new(catalog.clone());
    let config = config_from_args()?;
    for name in ["current_database", "rows_cache_limit_bytes"] {
        println!("{} = {}", name, config.get_as_value(name)?);
    }
    let ctx = Context::new(config);

    // select name, 'fresh' from fruit
    let plan: NodeRef = Arc::new(CachedResults::new(Arc::new(Project::new(
        vec![ProjectAction::Take(1), ProjectAction::Constant("fresh".into())],
        Arc::new(UnresolvedTable::new("fruit", "")),
    ))));
    println!("-----");
    println!("Plan before analysis:\n{}", plan);
    let plan = analyzer.analyze(&ctx, &plan)?;
    println!("Plan after analysis:\n{}", plan);

    let columns = vec!["name".to_string(), "state".to_string()];
    for pass in 1..=2 {
        let rows = sqlplan::run_plan(&ctx, &plan)?;
        println!("Pass {}:", pass);
        print!("{}", format_rows(&columns, &rows));
    }

    println!("-----");
    let as_of: NodeRef = Arc::new(UnresolvedTable::new("fruit", "").with_as_of(AsOf::new("2019-01-01")));
    let plan = analyzer.analyze(&ctx, &as_of)?;
    println!("Plan with AS OF after analysis:\n{}", plan);
    Ok(())
}
