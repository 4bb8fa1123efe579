//! End-to-end validation through the orchestrator with scripted backends.

use std::sync::Arc;
use std::time::Duration;

use govern_core::{
    Contract, EngineKind, RiskLevel, RuleCatalog, SemanticCatalog, Severity, Strategy,
    ValidationStatus,
};
use govern_runtime::testing::ScriptedBackend;
use govern_runtime::{BackendError, GenerateRequest, RuntimeConfig, ValidationOrchestrator};

const RESTRICTED_NO_RETENTION: &str = r#"
dataset:
  name: "key_vault_audit"
  owner: "security"
fields:
  - name: "event_id"
    type: "string"
    description: "Audit event key"
governance:
  classification: "restricted"
  encryption_required: true
"#;

const PUBLIC_SMALL: &str = r#"
dataset:
  name: "holidays"
  owner: "platform"
fields:
  - name: "date"
    type: "date"
  - name: "label"
    type: "string"
governance:
  classification: "public"
"#;

const CONFIDENTIAL_PII: &str = r#"
dataset:
  name: "customers"
  owner: "crm-team"
fields:
  - name: "customer_id"
    type: "string"
    required: true
    nullable: false
  - name: "email"
    type: "string"
    pii: true
  - name: "ssn"
    type: "string"
    pii: true
governance:
  classification: "confidential"
  retention_days: 365
  compliance_tags: ["GDPR", "CCPA"]
  approved_use_cases: ["billing"]
  data_residency: "EU"
"#;

const INTERNAL_PLAIN: &str = r#"
dataset:
  name: "orders"
  owner: "commerce"
fields:
  - name: "order_id"
    type: "string"
    description: "Order key"
  - name: "quantity"
    type: "int"
    description: "Units ordered"
  - name: "status"
    type: "string"
    description: "Fulfilment state"
governance:
  classification: "internal"
quality:
  completeness_threshold: 99
"#;

fn contract(yaml: &str) -> Contract {
    Contract::from_yaml(yaml).unwrap()
}

fn config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.retry.max_attempts = 2;
    config.retry.delay = Duration::from_millis(50);
    config
}

fn orchestrator(backend: Arc<ScriptedBackend>) -> ValidationOrchestrator {
    orchestrator_with_catalog(backend, SemanticCatalog::builtin().unwrap())
}

fn orchestrator_with_catalog(
    backend: Arc<ScriptedBackend>,
    semantic: SemanticCatalog,
) -> ValidationOrchestrator {
    ValidationOrchestrator::with_backend(
        backend,
        &config(),
        Arc::new(RuleCatalog::builtin().unwrap()),
        Arc::new(semantic),
    )
}

/// Empty answer in whatever shape the prompt asks for.
fn clean(request: &GenerateRequest) -> Result<String, BackendError> {
    let prompt = &request.prompt;
    let body = if prompt.contains("\"findings\"") {
        r#"{"findings": []}"#
    } else if prompt.contains("\"compliant\"") {
        r#"{"compliant": true, "issues": []}"#
    } else if prompt.contains("\"risks\"") {
        r#"{"risks": []}"#
    } else {
        r#"{"violations": []}"#
    };
    Ok(body.to_string())
}

#[tokio::test]
async fn restricted_without_retention_fails_with_critical_risk() {
    let orchestrator = orchestrator(Arc::new(ScriptedBackend::unreachable()));
    let contract = contract(RESTRICTED_NO_RETENTION);

    assert_eq!(orchestrator.analyze(&contract).risk_level, RiskLevel::Critical);

    let result = orchestrator.validate(&contract, Strategy::Adaptive).await;
    assert_eq!(result.status(), ValidationStatus::Failed);
    assert!(result
        .violations()
        .iter()
        .any(|v| v.policy_id == "SD-004" && v.severity == Severity::Critical));
    assert_eq!(result.metadata().unwrap().risk_level, RiskLevel::Critical);
}

#[tokio::test]
async fn low_risk_contract_runs_rules_only() {
    let backend = Arc::new(ScriptedBackend::with_responder(clean));
    let orchestrator = orchestrator(backend.clone());

    let result = orchestrator
        .validate(&contract(PUBLIC_SMALL), Strategy::Adaptive)
        .await;

    let metadata = result.metadata().unwrap();
    assert_eq!(metadata.strategy, Strategy::Fast);
    assert!(!metadata.semantic_degraded);
    assert!(metadata.semantic_policies.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn high_risk_contract_gets_thorough_review() {
    let backend = Arc::new(ScriptedBackend::with_responder(clean));
    let orchestrator = orchestrator(backend.clone());
    let contract = contract(CONFIDENTIAL_PII);

    let analysis = orchestrator.analyze(&contract);
    assert!(matches!(analysis.risk_level, RiskLevel::High | RiskLevel::Critical));

    let result = orchestrator.validate(&contract, Strategy::Adaptive).await;
    let metadata = result.metadata().unwrap();
    assert_eq!(metadata.strategy, Strategy::Thorough);
    assert_eq!(metadata.semantic_policies.len(), 5);
    assert_eq!(metadata.estimated_seconds, 0.1 + 5.0 * 3.0);
    assert_eq!(backend.calls(), 5);
}

#[tokio::test]
async fn unreachable_backend_degrades_to_fast() {
    let backend = Arc::new(ScriptedBackend::unreachable());
    let orchestrator = orchestrator(backend.clone());
    let contract = contract(CONFIDENTIAL_PII);

    let result = orchestrator.validate(&contract, Strategy::Thorough).await;
    let metadata = result.metadata().unwrap();
    assert_eq!(metadata.strategy, Strategy::Fast);
    assert!(metadata.semantic_degraded);
    assert!(result
        .violations()
        .iter()
        .all(|v| v.engine == EngineKind::RuleBased));

    let (strategy, reasoning) = orchestrator.recommend_strategy(&contract).await;
    assert_eq!(strategy, Strategy::Fast);
    assert!(reasoning.contains("unavailable"), "{}", reasoning);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn encryption_findings_on_same_field_are_merged() {
    let catalog = SemanticCatalog::from_yaml(
        r#"
policies:
  - id: "encryption-review"
    name: "Encryption review"
    severity: warning
    description: "Fields holding secrets must be encrypted."
    prompt_template: |
      Dataset {dataset_name}: {fields}
      {"violations": [{"field": "<name>", "message": "<why>"}]}
"#,
    )
    .unwrap();
    let backend = Arc::new(ScriptedBackend::replying(
        r#"{"violations": [{"field": "ssn", "message": "Social security numbers are stored unencrypted"}]}"#,
    ));
    let orchestrator = orchestrator_with_catalog(backend.clone(), catalog);

    let result = orchestrator
        .validate(&contract(CONFIDENTIAL_PII), Strategy::Thorough)
        .await;

    let on_ssn: Vec<_> = result
        .violations()
        .iter()
        .filter(|v| v.field.as_deref() == Some("ssn") && v.policy.to_lowercase().contains("encryption"))
        .collect();
    assert_eq!(on_ssn.len(), 1);
    assert_eq!(on_ssn[0].engine, EngineKind::RuleBased);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn violations_sorted_by_severity() {
    let backend = Arc::new(ScriptedBackend::with_responder(|request| {
        if request.prompt.contains("Business logic")
            || request.prompt.contains("contradictions")
        {
            Ok(r#"{"violations": [
                {"field": "status", "message": "Minor", "severity": "info"},
                {"field": "quantity", "message": "Quantity may be negative", "severity": "warning"},
                {"field": "order_id", "message": "Key is nullable but must be unique", "severity": "critical"}
            ]}"#
            .to_string())
        } else {
            clean(request)
        }
    }));
    let orchestrator = orchestrator(backend);

    let result = orchestrator
        .validate(&contract(INTERNAL_PLAIN), Strategy::Thorough)
        .await;

    let severities: Vec<Severity> = result.violations().iter().map(|v| v.severity).collect();
    assert!(severities.contains(&Severity::Critical));
    assert!(severities.contains(&Severity::Info));
    assert!(
        severities.windows(2).all(|w| w[0].rank() <= w[1].rank()),
        "{:?}",
        severities
    );
    assert_eq!(result.status(), ValidationStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn retry_exhaustion_yields_one_advisory_per_policy() {
    let backend = Arc::new(ScriptedBackend::failing(BackendError::Connection(
        "connection reset by peer".to_string(),
    )));
    let orchestrator = orchestrator(backend);

    let result = orchestrator
        .validate(&contract(CONFIDENTIAL_PII), Strategy::Thorough)
        .await;

    let advisories: Vec<_> = result
        .violations()
        .iter()
        .filter(|v| v.engine == EngineKind::Semantic)
        .collect();
    assert_eq!(advisories.len(), 5);
    assert!(advisories.iter().all(|v| v.severity == Severity::Warning));
    assert!(advisories.iter().all(|v| v.remediation.contains("reachable")));

    let mut ids: Vec<&str> = advisories.iter().map(|v| v.policy_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn malformed_output_skips_only_that_policy() {
    let backend = Arc::new(ScriptedBackend::with_responder(|request| {
        if request.prompt.contains("\"compliant\"") {
            Ok("The contract looks compliant to me!".to_string())
        } else {
            clean(request)
        }
    }));
    let orchestrator = orchestrator(backend.clone());
    let contract = contract(CONFIDENTIAL_PII);

    let rules_only = orchestrator.rule_engine().evaluate(&contract);
    let result = orchestrator.validate(&contract, Strategy::Thorough).await;

    assert!(result
        .violations()
        .iter()
        .all(|v| v.engine == EngineKind::RuleBased));
    assert_eq!(result.passed(), rules_only.passed + 4);
    assert_eq!(backend.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn identical_requests_are_served_from_cache() {
    let backend = Arc::new(ScriptedBackend::with_responder(clean));
    let orchestrator = orchestrator(backend.clone());
    let contract = contract(CONFIDENTIAL_PII);

    let first = orchestrator.validate(&contract, Strategy::Thorough).await;
    let second = orchestrator.validate(&contract, Strategy::Thorough).await;

    assert_eq!(first.violations(), second.violations());
    assert_eq!(backend.calls(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn orchestrator_shared_across_tasks() {
    let backend = Arc::new(ScriptedBackend::with_responder(clean));
    let orchestrator = Arc::new(orchestrator(backend));

    let handles: Vec<_> = [PUBLIC_SMALL, INTERNAL_PLAIN, RESTRICTED_NO_RETENTION]
        .into_iter()
        .map(|yaml| {
            let orchestrator = orchestrator.clone();
            let contract = contract(yaml);
            tokio::spawn(async move { orchestrator.validate(&contract, Strategy::Adaptive).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.metadata().is_some());
    }
}
