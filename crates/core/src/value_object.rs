//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**; two instances with the same attribute
/// values are equal. In this workspace `Money` (integer cents) and `TagSet`
/// (normalized tag collection) are value objects, while an inventory
/// `Record` is an entity keyed by its `Sku`.
///
/// To "modify" a value object, build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Money(i64);
///
/// impl ValueObject for Money {}
///
/// assert_eq!(Money(606), Money(606));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
