use std::collections::{BTreeMap, HashMap, HashSet};

use lexgraph::model::{Pairing, PairingRules};
use lexgraph::{config::Config, Lexicon};

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[usize], p: f64) -> usize {
    if sorted_values.is_empty() {
        return 0;
    }
    let index = ((sorted_values.len() - 1) as f64 * p).ceil() as usize;
    sorted_values[index.min(sorted_values.len() - 1)]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load_or_default()?;
    let lexicon = Lexicon::open(&config)?;
    let store = lexicon.store();

    let words = store.words()?;
    let connections = store.connections()?;
    let relation_types = store.relation_types()?;
    let pos_types = store.pos_types()?;

    println!("\n=== Lexgraph Statistics ({}) ===\n", config.db_path().display());

    println!("Collections:");
    println!("  Words:           {}", words.len());
    println!("  Connections:     {}", connections.len());
    println!("  Relation types:  {}", relation_types.len());
    println!("  Parts of speech: {}", pos_types.len());
    println!("  Projects:        {}", store.projects()?.len());

    // Connections per relation
    let mut per_relation: BTreeMap<&str, usize> = BTreeMap::new();
    for conn in &connections {
        *per_relation.entry(conn.relation.as_str()).or_default() += 1;
    }
    if !per_relation.is_empty() {
        println!("\nConnections by Relation:\n");
        println!("{:-<50}", "");
        println!("{:<20} {:>10} {:>15}", "Relation", "Count", "Pairing");
        println!("{:-<50}", "");
        let rules = PairingRules::from_types(&relation_types);
        for (relation, count) in &per_relation {
            let pairing = match rules.pairing(relation) {
                Pairing::Unpaired if !rules.is_known(relation) => "unregistered".to_string(),
                Pairing::Unpaired => "-".to_string(),
                Pairing::Symmetric => "symmetric".to_string(),
                Pairing::Reverse(reverse) => reverse.to_string(),
            };
            println!("{:<20} {:>10} {:>15}", relation, count, pairing);
        }
        println!("{:-<50}", "");
    }

    // Degree distribution
    let mut degree: HashMap<&str, usize> = words.iter().map(|w| (w.id.as_str(), 0)).collect();
    for conn in &connections {
        for end in [conn.source.as_str(), conn.target.as_str()] {
            if let Some(d) = degree.get_mut(end) {
                *d += 1;
            }
        }
    }
    let mut degrees: Vec<usize> = degree.values().copied().collect();
    degrees.sort_unstable();
    if !degrees.is_empty() {
        let isolated = degrees.iter().filter(|d| **d == 0).count();
        println!("\nDegree Distribution:\n");
        println!("{:-<50}", "");
        println!("{:<15} {:>15}", "Percentile", "Connections");
        println!("{:-<50}", "");
        println!("{:<15} {:>15}", "P50", percentile(&degrees, 0.50));
        println!("{:<15} {:>15}", "P95", percentile(&degrees, 0.95));
        println!("{:<15} {:>15}", "Max", degrees.last().copied().unwrap_or(0));
        println!("{:-<50}", "");
        println!("  Isolated words: {}", isolated);
    }

    // Stale references
    let word_ids: HashSet<&str> = words.iter().map(|w| w.id.as_str()).collect();
    let relation_keys: HashSet<&str> = relation_types.iter().map(|rt| rt.key.as_str()).collect();
    let pos_keys: HashSet<&str> = pos_types.iter().map(|pt| pt.key.as_str()).collect();

    let dangling = connections
        .iter()
        .filter(|c| !word_ids.contains(c.source.as_str()) || !word_ids.contains(c.target.as_str()))
        .count();
    let unregistered = connections
        .iter()
        .filter(|c| !relation_keys.contains(c.relation.as_str()))
        .count();
    let broken_pairs = relation_types
        .iter()
        .filter(|rt| rt.pair_with.as_ref().map_or(false, |p| !relation_keys.contains(p.as_str())))
        .count();
    let unknown_pos = words
        .iter()
        .flat_map(|w| w.pos_list())
        .filter(|key| !pos_keys.contains(key.as_str()))
        .count();
    let rules = PairingRules::from_types(&relation_types);
    let missing_reverses = connections
        .iter()
        .filter(|c| match rules.pairing(c.relation.as_str()) {
            Pairing::Reverse(reverse) => {
                word_ids.contains(c.target.as_str())
                    && !connections.iter().any(|r| r.is(&c.target, &c.source, reverse.as_str()))
            }
            _ => false,
        })
        .count();

    println!("\nStale References:");
    println!("  Connections with a missing word:     {}", dangling);
    println!("  Connections with unregistered type:  {}", unregistered);
    println!("  Pairings pointing at missing types:  {}", broken_pairs);
    println!("  Paired connections missing reverse:  {}", missing_reverses);
    println!("  Unregistered part-of-speech uses:    {}", unknown_pos);

    // Raw storage
    println!("\nStorage Entries:");
    for (key, size) in store.backend().entries()? {
        println!("  {:<32} {:>10} bytes", key, size);
    }

    println!();

    Ok(())
}
