//! Suggested stack names for the init wizard

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "agile", "bold", "calm", "clean", "crisp", "deft", "fleet", "gentle", "hardy", "lucid",
    "modest", "neat", "orderly", "poised", "quiet", "sturdy", "tidy", "brisk", "steady", "sunny",
];

const NOUNS: &[&str] = &[
    "archive", "bucket", "circuit", "domain", "engine", "gateway", "handler", "index", "layer",
    "module", "notebook", "portal", "record", "router", "shelf", "table", "timer", "trigger",
    "usecase", "vault",
];

/// Generate a stack name like "tidy-router-2847"
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let number: u16 = rng.gen_range(1000..10000);
    format!("{}-{}-{}", adjective, noun, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_is_a_valid_stack_name() {
        let name = generate();
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NOUNS.contains(&parts[1]));
        let number: u16 = parts[2].parse().unwrap();
        assert!((1000..10000).contains(&number));

        let mut config = clean_serverless_config::StackConfig::default();
        config.stack.name = name;
        config.table.missing_values = clean_serverless_config::MissingValuePolicy::Empty;
        assert!(config.validate().is_ok());
    }
}
