//! Human-readable prototype and method signature rendering.
//!
//! Signatures are a diagnostic surface: the renderers never fail. When any
//! lookup along the way cannot be resolved, [`NO_SIGNATURE`] is returned (or a
//! parameter is skipped) instead of propagating the error. Content bytes are
//! modified UTF-8, so rendering goes through [`String::from_utf8_lossy`].

use crate::metadata::{
    strings::NO_INDEX,
    tables::{Dex, MethodId, ProtoId},
};

/// Placeholder rendered when a signature cannot be resolved.
pub const NO_SIGNATURE: &str = "<no signature>";

impl Dex<'_> {
    /// Render a method's parameter signature, e.g. `(ILjava/lang/String;)`.
    ///
    /// Resolves the method's prototype and delegates to
    /// [`proto_signature`](Dex::proto_signature). A prototype index that cannot
    /// be resolved yields [`NO_SIGNATURE`].
    #[must_use]
    pub fn method_signature(&self, method_id: &MethodId) -> String {
        match self.proto_id(u32::from(method_id.proto_idx)) {
            Ok(proto) => self.proto_signature(&proto),
            Err(_) => NO_SIGNATURE.to_string(),
        }
    }

    /// Render a prototype's parameter signature.
    ///
    /// A prototype with no parameter list renders as `()`. Otherwise each
    /// parameter's type descriptor is appended in list order; a descriptor
    /// that cannot be resolved (sentinel index or failed lookup) is skipped
    /// rather than aborting the rendering. A parameter list that cannot be
    /// materialized at all yields [`NO_SIGNATURE`].
    #[must_use]
    pub fn proto_signature(&self, proto: &ProtoId) -> String {
        let list = match self.proto_parameters(proto) {
            Ok(Some(list)) => list,
            Ok(None) => return "()".to_string(),
            Err(_) => return NO_SIGNATURE.to_string(),
        };

        let mut signature = String::from("(");
        for type_idx in list.iter() {
            if let Ok(Some(descriptor)) = self.type_descriptor(u32::from(type_idx)) {
                signature.push_str(&String::from_utf8_lossy(descriptor));
            }
        }
        signature.push(')');
        signature
    }

    /// Render the type descriptor at `type_idx` as text, or `None` for the
    /// sentinel or an unresolvable index.
    #[must_use]
    pub fn type_descriptor_string(&self, type_idx: u32) -> Option<String> {
        if type_idx == NO_INDEX {
            return None;
        }
        match self.type_descriptor(type_idx) {
            Ok(Some(descriptor)) => Some(String::from_utf8_lossy(descriptor).into_owned()),
            _ => None,
        }
    }
}
