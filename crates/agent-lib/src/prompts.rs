//! Prompt text for the language model

use crate::models::ClusterSummary;

/// Instructs the model to emit only the intent fields, each from a
/// closed vocabulary.
pub const INTENT_SYSTEM_PROMPT: &str = r#"You translate questions about a Kubernetes cluster into a JSON object.
Respond with exactly one JSON object and nothing else, using these keys:
  "resource_kind": one of "Pod", "Deployment", "Node", "Namespace", "Log", "Unknown"
  "attribute": one of "Count", "Status", "Name", "LogText", "Existence", "Unknown"
  "namespace": the namespace named in the question, "*" for all namespaces, or "default"
  "target": the resource name or label selector (key=value) the question is about, or null
  "container": the container name for log questions, or null
Use "Count" for how-many questions, "Status" for state or phase, "Name" for which/what-is-called questions,
"LogText" for log questions, and "Existence" for is-there/does-exist questions.
If the question is not about these resources, use "Unknown"."#;

/// Instructs the model to answer with a bare value
pub const DIRECT_ANSWER_SYSTEM_PROMPT: &str = "You are a Kubernetes assistant. Answer the query based only on the cluster information, without any explanations. Answer in as few words as possible, ideally one. Provide only the necessary information without technical identifiers, generated suffixes, or justifications. Return only the answer.";

/// User prompt for intent extraction
pub fn intent_prompt(query: &str) -> String {
    format!("Question: {}", query.trim())
}

/// User prompt for the degraded path: the question plus cluster context
pub fn direct_answer_prompt(query: &str, summary: &ClusterSummary) -> String {
    let version = summary.kubernetes_version.as_deref().unwrap_or("unknown");
    let pods = summary
        .pods
        .iter()
        .map(|ns| format!("{}: {}", ns.namespace, ns.pods.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "The user asked: '{query}'\n\
         Here is the cluster information:\n\
         - Kubernetes Version: {version}\n\
         - Number of Nodes: {node_count}\n\
         - Nodes: {nodes}\n\
         - Namespaces: {namespaces}\n\
         - Pods: {pods}",
        query = query.trim(),
        version = version,
        node_count = summary.nodes.len(),
        nodes = summary.nodes.join(", "),
        namespaces = summary.namespaces.join(", "),
        pods = pods,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NamespacePods;

    #[test]
    fn test_direct_answer_prompt_includes_context() {
        let summary = ClusterSummary {
            kubernetes_version: Some("v1.28.3".to_string()),
            nodes: vec!["node-a".to_string(), "node-b".to_string()],
            namespaces: vec!["default".to_string(), "kube-system".to_string()],
            pods: vec![NamespacePods {
                namespace: "default".to_string(),
                pods: vec!["web-1".to_string(), "web-2".to_string()],
            }],
        };

        let prompt = direct_answer_prompt("  Which version?  ", &summary);

        assert!(prompt.contains("The user asked: 'Which version?'"));
        assert!(prompt.contains("Kubernetes Version: v1.28.3"));
        assert!(prompt.contains("Number of Nodes: 2"));
        assert!(prompt.contains("Namespaces: default, kube-system"));
        assert!(prompt.contains("Pods: default: web-1, web-2"));
    }
}
