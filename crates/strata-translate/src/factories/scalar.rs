use std::sync::Arc;

use strata_types::{Object, Path, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scalar {
    Bool,
    Integer,
    Float,
    Text,
    Bytes,
    Key,
}

impl Scalar {
    fn of(ty: &TypeDesc) -> Option<Self> {
        match ty {
            TypeDesc::Bool => Some(Self::Bool),
            TypeDesc::Integer => Some(Self::Integer),
            TypeDesc::Float => Some(Self::Float),
            TypeDesc::Text => Some(Self::Text),
            TypeDesc::Bytes => Some(Self::Bytes),
            TypeDesc::Key => Some(Self::Key),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Key => "key",
        }
    }
}

/// `v` as an integer if the conversion is exact.
fn exact_integer(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
    (v.is_finite() && v.fract() == 0.0 && in_range).then_some(v as i64)
}

/// Produces translators for scalar fields.
pub struct ScalarTranslatorFactory;

impl TranslatorFactory for ScalarTranslatorFactory {
    fn name(&self) -> &str {
        "scalar"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        _annotations: &Annotations,
        _ctx: &mut CreateContext<'_>,
        _path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        Ok(Scalar::of(ty).map(|scalar| Arc::new(ScalarTranslator { scalar }) as Arc<dyn Translator>))
    }
}

/// Nulls are never stored: a null value saves as `Skip` and a null node
/// loads as `Skip`.
struct ScalarTranslator {
    scalar: Scalar,
}

impl Translator for ScalarTranslator {
    fn load(
        &self,
        node: &Value,
        _existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        let coerce = ctx.config().coerce_numbers;
        let object = match (self.scalar, node) {
            (_, Value::Null) => return Ok(Translated::Skip),
            (Scalar::Bool, Value::Bool(v)) => Object::Bool(*v),
            (Scalar::Integer, Value::Integer(v)) => Object::Integer(*v),
            (Scalar::Integer, Value::Float(v)) if coerce => match exact_integer(*v) {
                Some(v) => Object::Integer(v),
                None => return Err(TranslateError::mismatch(path, "integer", "non-integral float")),
            },
            (Scalar::Float, Value::Float(v)) => Object::Float(*v),
            (Scalar::Float, Value::Integer(v)) if coerce => Object::Float(*v as f64),
            (Scalar::Text, Value::Text(v)) => Object::Text(v.clone()),
            (Scalar::Bytes, Value::Bytes(v)) => Object::Bytes(v.clone()),
            (Scalar::Key, Value::Key(v)) => Object::Key(v.clone()),
            (scalar, other) => {
                return Err(TranslateError::mismatch(path, scalar.name(), other.type_name()))
            }
        };
        Ok(Translated::Value(object))
    }

    fn save(
        &self,
        object: &Object,
        _index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>> {
        let coerce = ctx.config().coerce_numbers;
        let node = match (self.scalar, object) {
            (_, Object::Null) => return Ok(Translated::Skip),
            (Scalar::Bool, Object::Bool(v)) => Value::Bool(*v),
            (Scalar::Integer, Object::Integer(v)) => Value::Integer(*v),
            (Scalar::Float, Object::Float(v)) => Value::Float(*v),
            (Scalar::Float, Object::Integer(v)) if coerce => Value::Float(*v as f64),
            (Scalar::Text, Object::Text(v)) => Value::Text(v.clone()),
            (Scalar::Bytes, Object::Bytes(v)) => Value::Bytes(v.clone()),
            (Scalar::Key, Object::Key(v)) => Value::Key(v.clone()),
            (scalar, other) => {
                return Err(TranslateError::mismatch(path, scalar.name(), other.type_name()))
            }
        };
        Ok(Translated::Value(node))
    }
}
