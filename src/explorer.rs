//! Trade route exploration
//!
//! Depth-first enumeration of every acyclic chain of trades reachable from a
//! starting item, carrying exact quantities along each chain.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use log::{debug, warn};

use crate::catalog::Catalog;
use crate::models::{Direction, Quantity, Transaction, TradeRule};

/// Which way to walk the catalog from the starting item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    /// "I have this item": follow rules where it is the source.
    Forward,
    /// "I want this item": follow rules where it is the destination.
    Backward,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorerConfig {
    /// Stop extending a path after this many steps. `None` means no cap.
    pub max_depth: Option<usize>,
}

/// One candidate trade at a node of the search, followed by every way the
/// route can continue from it. An empty continuation ends the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBranch {
    pub transaction: Transaction,
    pub continuation: Vec<RouteBranch>,
}

/// A single complete chain of trades.
pub type Route = Vec<Transaction>;

/// Collapsed route shape: a node with exactly one candidate is spliced
/// inline as a `Step` followed by its continuation, while a node with two or
/// more candidates yields one `Branch` per candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedRoute {
    Step(Transaction),
    Branch(Vec<NestedRoute>),
}

/// Routes that trade away `quantity` of `item`.
pub fn find_routes_from(quantity: &Quantity, item: &str, catalog: &Catalog) -> Vec<RouteBranch> {
    find_routes(Search::Forward, quantity, item, catalog, ExplorerConfig::default())
}

/// Routes that end with `quantity` of `item`.
pub fn find_routes_to(quantity: &Quantity, item: &str, catalog: &Catalog) -> Vec<RouteBranch> {
    find_routes(Search::Backward, quantity, item, catalog, ExplorerConfig::default())
}

pub fn find_routes(
    search: Search,
    quantity: &Quantity,
    item: &str,
    catalog: &Catalog,
    config: ExplorerConfig,
) -> Vec<RouteBranch> {
    let mut explorer = Explorer {
        catalog,
        search,
        starting_item: item,
        config,
        used: HashSet::new(),
        nodes: 0,
        capped: 0,
    };
    let routes = explorer.explore(quantity, item, 0);

    debug!(
        "Explored {:?} from {} {}: {} nodes, {} top-level branches",
        search,
        quantity,
        item,
        explorer.nodes,
        routes.len()
    );
    if explorer.capped > 0 {
        warn!(
            "{} paths were cut at the depth limit of {:?}",
            explorer.capped, explorer.config.max_depth
        );
    }

    routes
}

struct Explorer<'a> {
    catalog: &'a Catalog,
    search: Search,
    starting_item: &'a str,
    config: ExplorerConfig,
    // Rules on the current path only; added before recursing, removed after.
    used: HashSet<&'a TradeRule>,
    nodes: usize,
    capped: usize,
}

impl<'a> Explorer<'a> {
    fn explore(&mut self, quantity: &Quantity, item: &str, depth: usize) -> Vec<RouteBranch> {
        self.nodes += 1;

        let candidates = self.candidates(item);
        if candidates.is_empty() {
            return Vec::new();
        }

        if self.config.max_depth.is_some_and(|max| depth >= max) {
            self.capped += 1;
            return Vec::new();
        }

        let mut branches = Vec::with_capacity(candidates.len());
        for rule in candidates {
            let (transaction, next_item) = self.step(quantity, rule);

            self.used.insert(rule);
            let continuation = self.explore(&transaction.count, next_item, depth + 1);
            self.used.remove(rule);

            branches.push(RouteBranch {
                transaction,
                continuation,
            });
        }
        branches
    }

    fn candidates(&self, item: &str) -> Vec<&'a TradeRule> {
        let catalog = self.catalog;
        let incident: Vec<&'a TradeRule> = match self.search {
            Search::Forward => catalog.rules_from(item).collect(),
            Search::Backward => catalog.rules_to(item).collect(),
        };

        // Once the path has started, it may not lead back to the starting item.
        incident
            .into_iter()
            .filter(|rule| !self.used.contains(rule))
            .filter(|rule| self.used.is_empty() || self.far_endpoint(rule) != self.starting_item)
            .collect()
    }

    fn far_endpoint<'r>(&self, rule: &'r TradeRule) -> &'r str {
        match self.search {
            Search::Forward => &rule.to_item,
            Search::Backward => &rule.from_item,
        }
    }

    fn step(&self, quantity: &Quantity, rule: &'a TradeRule) -> (Transaction, &'a str) {
        match self.search {
            Search::Forward => {
                let produced = quantity.scale(rule.to_count, rule.from_count);
                (Transaction::new(Direction::To, produced, rule.clone()), &rule.to_item)
            }
            Search::Backward => {
                let needed = quantity.scale(rule.from_count, rule.to_count);
                (Transaction::new(Direction::From, needed, rule.clone()), &rule.from_item)
            }
        }
    }
}

/// Convert a route tree into the collapsed nested shape.
pub fn to_nested(routes: &[RouteBranch]) -> Vec<NestedRoute> {
    match routes {
        [single] => nested_chain(single),
        _ => routes
            .iter()
            .map(|branch| NestedRoute::Branch(nested_chain(branch)))
            .collect(),
    }
}

fn nested_chain(branch: &RouteBranch) -> Vec<NestedRoute> {
    let mut chain = vec![NestedRoute::Step(branch.transaction.clone())];
    chain.extend(to_nested(&branch.continuation));
    chain
}

/// Every complete route in the tree, in search order.
pub fn flatten(routes: &[RouteBranch]) -> Vec<Route> {
    let mut complete = Vec::new();
    let mut path = Vec::new();
    collect_routes(routes, &mut path, &mut complete);
    complete
}

fn collect_routes(routes: &[RouteBranch], path: &mut Route, complete: &mut Vec<Route>) {
    for branch in routes {
        path.push(branch.transaction.clone());
        if branch.continuation.is_empty() {
            complete.push(path.clone());
        } else {
            collect_routes(&branch.continuation, path, complete);
        }
        path.pop();
    }
}

/// Format a route tree as an indented listing.
///
/// A linear continuation stays at the same indentation; each option at a
/// branch point is marked with `+` and its continuation is indented.
pub fn format_routes(routes: &[RouteBranch], indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    match routes {
        [] => {}
        [single] => {
            output.push_str(&format!("{}{}\n", prefix, single.transaction));
            output.push_str(&format_routes(&single.continuation, indent));
        }
        _ => {
            for branch in routes {
                output.push_str(&format!("{}+ {}\n", prefix, branch.transaction));
                output.push_str(&format_routes(&branch.continuation, indent + 1));
            }
        }
    }

    output
}

/// Format the collapsed nested shape, one bracketed block per branch.
pub fn format_nested(nested: &[NestedRoute], indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    for entry in nested {
        match entry {
            NestedRoute::Step(transaction) => {
                output.push_str(&format!("{}{}\n", prefix, transaction));
            }
            NestedRoute::Branch(chain) => {
                output.push_str(&format!("{}[\n", prefix));
                output.push_str(&format_nested(chain, indent + 1));
                output.push_str(&format!("{}]\n", prefix));
            }
        }
    }

    output
}

/// Overview of a route tree
#[derive(Debug)]
pub struct RouteSummary {
    pub start_item: String,
    pub start_quantity: Quantity,
    pub route_count: usize,
    pub longest_route: usize,
    pub items: Vec<String>,
    pub locations: Vec<String>,
}

pub fn summarize(routes: &[RouteBranch], start_item: &str, start_quantity: &Quantity) -> RouteSummary {
    let complete = flatten(routes);

    let mut items = BTreeSet::new();
    let mut locations = BTreeSet::new();
    for transaction in complete.iter().flatten() {
        items.insert(transaction.rule.from_item.clone());
        items.insert(transaction.rule.to_item.clone());
        locations.insert(transaction.rule.location.clone());
    }

    RouteSummary {
        start_item: start_item.to_string(),
        start_quantity: start_quantity.clone(),
        route_count: complete.len(),
        longest_route: complete.iter().map(Vec::len).max().unwrap_or(0),
        items: items.into_iter().collect(),
        locations: locations.into_iter().collect(),
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Route Summary ===")?;
        writeln!(f, "Start: {} {}", self.start_quantity, self.start_item)?;
        writeln!(f, "Complete routes: {}", self.route_count)?;
        writeln!(f, "Longest route: {} steps", self.longest_route)?;
        writeln!(f)?;

        writeln!(f, "Items involved:")?;
        for item in &self.items {
            writeln!(f, "  {}", item)?;
        }
        writeln!(f)?;

        writeln!(f, "Locations:")?;
        for location in &self.locations {
            writeln!(f, "  {}", location)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(rules: &[(&str, u64, &str, u64, &str)]) -> Catalog {
        Catalog::from_rules(
            rules
                .iter()
                .map(|&(location, from_count, from_item, to_count, to_item)| {
                    TradeRule::new(location, from_count, from_item, to_count, to_item)
                }),
        )
    }

    fn town() -> Catalog {
        catalog(&[("Town", 2, "Wood", 5, "Nails"), ("Town", 5, "Nails", 1, "Hammer")])
    }

    fn items_of(route: &Route) -> Vec<String> {
        route
            .iter()
            .map(|t| format!("{}>{}", t.rule.from_item, t.rule.to_item))
            .collect()
    }

    #[test]
    fn test_forward_quantity() {
        let catalog = catalog(&[("Town", 2, "Wood", 5, "Nails")]);
        let routes = find_routes_from(&Quantity::from_count(4), "Wood", &catalog);

        assert_eq!(routes.len(), 1);
        let step = &routes[0].transaction;
        assert_eq!(step.direction, Direction::To);
        assert_eq!(step.count, Quantity::from_count(10));
        assert_eq!(step.from_quantity(), Quantity::from_count(4));
    }

    #[test]
    fn test_backward_quantity() {
        let catalog = catalog(&[("Town", 2, "Wood", 5, "Nails")]);
        let routes = find_routes_to(&Quantity::from_count(10), "Nails", &catalog);

        assert_eq!(routes.len(), 1);
        let step = &routes[0].transaction;
        assert_eq!(step.direction, Direction::From);
        assert_eq!(step.count, Quantity::from_count(4));
        assert_eq!(step.to_quantity(), Quantity::from_count(10));
    }

    #[test]
    fn test_linear_chain_end_to_end() {
        let routes = find_routes_from(&Quantity::from_count(4), "Wood", &town());

        let nested = to_nested(&routes);
        assert_eq!(nested.len(), 2);
        let NestedRoute::Step(first) = &nested[0] else {
            panic!("expected a flat step, got {:?}", nested[0]);
        };
        let NestedRoute::Step(second) = &nested[1] else {
            panic!("expected a flat step, got {:?}", nested[1]);
        };
        assert_eq!(first.to_string(), "From 4 Wood to 10 Nails at Town");
        assert_eq!(second.to_string(), "From 10 Nails to 2 Hammer at Town");
        assert_eq!(second.count, Quantity::from_count(2));

        assert_eq!(flatten(&routes).len(), 1);
    }

    #[test]
    fn test_backward_chain() {
        let routes = find_routes_to(&Quantity::from_count(2), "Hammer", &town());
        let complete = flatten(&routes);

        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0][0].count, Quantity::from_count(10));
        assert_eq!(complete[0][1].count, Quantity::from_count(4));
        assert_eq!(complete[0][1].to_string(), "From 4 Wood to 10 Nails at Town");
    }

    #[test]
    fn test_fractional_quantities_stay_exact() {
        let routes = find_routes_from(&Quantity::from_count(3), "Wood", &town());
        let complete = flatten(&routes);

        assert_eq!(complete[0][0].count, Quantity::from_ratio(15, 2));
        assert_eq!(complete[0][1].count, Quantity::from_ratio(3, 2));
        assert_eq!(complete[0][1].to_string(), "From 7.5 Nails to 1.5 Hammer at Town");
    }

    #[test]
    fn test_branch_point_yields_one_entry_per_candidate() {
        let catalog = catalog(&[
            ("Town", 1, "Wood", 2, "Planks"),
            ("Mill", 1, "Wood", 3, "Sawdust"),
        ]);
        let routes = find_routes_from(&Quantity::from_count(1), "Wood", &catalog);

        assert_eq!(routes.len(), 2);
        let nested = to_nested(&routes);
        assert_eq!(nested.len(), 2);
        for entry in &nested {
            match entry {
                NestedRoute::Branch(chain) => assert_eq!(chain.len(), 1),
                NestedRoute::Step(_) => panic!("branch point must not collapse"),
            }
        }
    }

    #[test]
    fn test_empty_terminal() {
        let routes = find_routes_from(&Quantity::from_count(1), "Hammer", &town());
        assert!(routes.is_empty());
        assert!(to_nested(&routes).is_empty());
        assert!(flatten(&routes).is_empty());

        let routes = find_routes_to(&Quantity::from_count(1), "Wood", &town());
        assert!(routes.is_empty());
    }

    #[test]
    fn test_path_never_returns_to_start() {
        let catalog = catalog(&[
            ("Town", 1, "A", 1, "B"),
            ("Town", 1, "B", 1, "A"),
            ("Town", 1, "B", 1, "C"),
            ("Town", 1, "C", 1, "A"),
        ]);
        let routes = find_routes_from(&Quantity::from_count(1), "A", &catalog);
        let complete = flatten(&routes);

        assert_eq!(complete.len(), 1);
        assert_eq!(items_of(&complete[0]), vec!["A>B", "B>C"]);
        for route in &complete {
            assert!(route.iter().skip(1).all(|t| t.rule.to_item != "A"));
        }
    }

    #[test]
    fn test_first_step_may_touch_start() {
        let catalog = catalog(&[("Town", 2, "A", 1, "A"), ("Town", 1, "A", 1, "B")]);
        let routes = find_routes_from(&Quantity::from_count(4), "A", &catalog);
        let complete = flatten(&routes);

        let shapes: Vec<_> = complete.iter().map(items_of).collect();
        assert!(shapes.contains(&vec!["A>A".to_string(), "A>B".to_string()]));
        assert!(shapes.contains(&vec!["A>B".to_string()]));
    }

    #[test]
    fn test_backward_path_never_returns_to_start() {
        let catalog = catalog(&[
            ("Town", 1, "B", 1, "A"),
            ("Town", 1, "A", 1, "B"),
            ("Town", 1, "C", 1, "B"),
        ]);
        let routes = find_routes_to(&Quantity::from_count(1), "A", &catalog);
        let complete = flatten(&routes);

        assert_eq!(complete.len(), 1);
        assert_eq!(items_of(&complete[0]), vec!["B>A", "C>B"]);
        for route in &complete {
            assert!(route.iter().skip(1).all(|t| t.rule.from_item != "A"));
        }
    }

    #[test]
    fn test_backward_first_step_may_touch_start() {
        let catalog = catalog(&[("Town", 2, "A", 1, "A"), ("Town", 1, "B", 1, "A")]);
        let routes = find_routes_to(&Quantity::from_count(4), "A", &catalog);
        let complete = flatten(&routes);

        let shapes: Vec<_> = complete.iter().map(items_of).collect();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.contains(&vec!["B>A".to_string()]));
        assert!(shapes.contains(&vec!["A>A".to_string(), "B>A".to_string()]));

        let self_trade = complete.iter().find(|r| r.len() == 2).unwrap();
        assert_eq!(self_trade[0].count, Quantity::from_count(8));
        assert_eq!(self_trade[1].count, Quantity::from_count(8));
    }

    #[test]
    fn test_rule_not_reused_on_one_path() {
        let catalog = catalog(&[
            ("Town", 1, "A", 1, "B"),
            ("Town", 1, "B", 1, "C"),
            ("Town", 1, "C", 1, "B"),
        ]);
        let routes = find_routes_from(&Quantity::from_count(1), "A", &catalog);
        let complete = flatten(&routes);

        assert_eq!(complete.len(), 1);
        assert_eq!(items_of(&complete[0]), vec!["A>B", "B>C", "C>B"]);
    }

    #[test]
    fn test_siblings_may_reuse_a_rule() {
        let catalog = catalog(&[
            ("Town", 1, "Start", 1, "X"),
            ("Town", 1, "Start", 1, "Y"),
            ("Town", 1, "Y", 1, "X"),
            ("Town", 1, "X", 1, "Z"),
        ]);
        let routes = find_routes_from(&Quantity::from_count(1), "Start", &catalog);
        let complete = flatten(&routes);

        assert_eq!(complete.len(), 2);
        let shapes: Vec<_> = complete.iter().map(items_of).collect();
        assert!(shapes.contains(&vec!["Start>X".to_string(), "X>Z".to_string()]));
        assert!(shapes.contains(&vec![
            "Start>Y".to_string(),
            "Y>X".to_string(),
            "X>Z".to_string()
        ]));
    }

    #[test]
    fn test_dense_cycles_terminate() {
        let names = ["A", "B", "C", "D"];
        let mut rules = Vec::new();
        for from in names {
            for to in names {
                if from != to {
                    rules.push(TradeRule::new("Town", 1, from, 1, to));
                }
            }
        }
        let catalog = Catalog::from_rules(rules);

        let routes = find_routes_from(&Quantity::from_count(1), "A", &catalog);
        let complete = flatten(&routes);
        assert!(!complete.is_empty());
        for route in &complete {
            assert!(route.len() <= catalog.len());
            let unique: HashSet<_> = route.iter().map(|t| &t.rule).collect();
            assert_eq!(unique.len(), route.len());
        }
    }

    #[test]
    fn test_depth_cap() {
        let config = ExplorerConfig { max_depth: Some(1) };
        let routes = find_routes(Search::Forward, &Quantity::from_count(4), "Wood", &town(), config);

        assert_eq!(routes.len(), 1);
        assert!(routes[0].continuation.is_empty());
    }

    #[test]
    fn test_format_and_summary() {
        let catalog = catalog(&[
            ("Town", 2, "Wood", 5, "Nails"),
            ("Town", 5, "Nails", 1, "Hammer"),
            ("Port", 1, "Nails", 2, "Fish"),
        ]);
        let start = Quantity::from_count(4);
        let routes = find_routes_from(&start, "Wood", &catalog);

        let text = format_routes(&routes, 0);
        assert_eq!(
            text,
            "From 4 Wood to 10 Nails at Town\n\
             + From 10 Nails to 20 Fish at Port\n\
             + From 10 Nails to 2 Hammer at Town\n"
        );

        let summary = summarize(&routes, "Wood", &start);
        assert_eq!(summary.route_count, 2);
        assert_eq!(summary.longest_route, 2);
        assert_eq!(summary.items, vec!["Fish", "Hammer", "Nails", "Wood"]);
        assert_eq!(summary.locations, vec!["Port", "Town"]);
        assert!(summary.to_string().contains("Complete routes: 2"));

        let nested = format_nested(&to_nested(&routes), 0);
        assert_eq!(
            nested,
            "From 4 Wood to 10 Nails at Town\n\
             [\n\
             \x20 From 10 Nails to 20 Fish at Port\n\
             ]\n\
             [\n\
             \x20 From 10 Nails to 2 Hammer at Town\n\
             ]\n"
        );
    }
}
