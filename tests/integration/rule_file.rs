use statsd_rewrite_proxy::{load_rules, parse_rules, RuleResult, RulesError};
use std::path::PathBuf;

fn default_rules_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("rules/default.rules")
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn test_default_rules_load() {
    let rules = load_rules(default_rules_path()).unwrap();
    assert_eq!(rules.len(), 9);
}

#[test]
fn test_default_rules_rewrite_fabio() {
    let rules = load_rules(default_rules_path()).unwrap();

    assert_eq!(
        rules.evaluate("fabio.http.status.200"),
        RuleResult::Match {
            name: "fabio.http.response_code".to_owned(),
            tags: tags(&["code:200"]),
        }
    );
    assert_eq!(
        rules.evaluate("fabio.frontend.example_com.root.backend_1.mean"),
        RuleResult::Match {
            name: "fabio.service.requests.mean".to_owned(),
            tags: tags(&[
                "fabio_service:frontend",
                "fabio_host:example_com",
                "fabio_path:root",
                "fabio_upstream:backend_1",
                "fabio_dimension:mean",
            ]),
        }
    );
}

#[test]
fn test_default_rules_rewrite_nomad() {
    let rules = load_rules(default_rules_path()).unwrap();

    assert_eq!(
        rules.evaluate("nomad.client.uptime.node1"),
        RuleResult::Match {
            name: "nomad.client.uptime".to_owned(),
            tags: Vec::new(),
        }
    );
    assert_eq!(
        rules.evaluate("nomad.client.host.cpu.c668.cpu3.user"),
        RuleResult::Match {
            name: "nomad.client.cpu.user".to_owned(),
            tags: tags(&["client_id:c668", "nomad_cpu_core:cpu3", "nomad_metric:user"]),
        }
    );
    assert_eq!(
        rules.evaluate("nomad.client.allocs.web.frontend.a1b2.nginx.memory.rss"),
        RuleResult::Match {
            name: "nomad.allocation.memory.rss".to_owned(),
            tags: tags(&[
                "nomad_job:web",
                "nomad_task_group:frontend",
                "nomad_allocation_id:a1b2",
                "nomad_task:nginx",
                "nomad_metric:rss",
            ]),
        }
    );
    assert_eq!(rules.evaluate("consul.rpc.query"), RuleResult::Miss);
}

#[test]
fn test_bad_rule_file_names_the_line() {
    let err = parse_rules("relay ok.*\nmatch broken.{x} y.{z}\n").unwrap_err();
    assert!(matches!(err, RulesError::Pattern { line: 2, .. }));
    assert!(err.to_string().starts_with("line 2: "));
}
