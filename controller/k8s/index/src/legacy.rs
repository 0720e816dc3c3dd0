//! Normalizes `extensions/v1beta1` Ingresses into the `networking.k8s.io/v1beta1` shape.

use ingress_controller_k8s_api::ingress::{extensions, v1beta1};

#[derive(Debug, thiserror::Error)]
#[error("failed to transcode extensions/v1beta1 Ingress: {0}")]
pub struct TransposeError(#[from] serde_json::Error);

/// The two generations share a wire format, so the spec is transcoded through JSON rather than
/// copied field by field.
pub fn transpose_ingress(src: &extensions::Ingress) -> Result<v1beta1::Ingress, TransposeError> {
    let spec = serde_json::to_value(&src.spec)?;
    Ok(v1beta1::Ingress {
        metadata: src.metadata.clone(),
        spec: serde_json::from_value(spec)?,
    })
}
