use k8s_openapi::api::core::v1::PodCondition;

/// Whether a pod's condition list says it is ready to receive traffic.
///
/// True iff a `Ready` condition is present with status `True`. A missing
/// condition means not-ready, never an error.
pub fn is_ready(conditions: &[PodCondition]) -> bool {
    conditions
        .iter()
        .any(|c| c.type_ == "Ready" && c.status == "True")
}
