use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ops::BitAnd;

use crate::event::Event;

/// Reference to one field of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    record: &'static str,
    type_id: TypeId,
    field: String,
}

impl FieldRef {
    pub fn of<E: Event>(field: impl Into<String>) -> Self {
        Self {
            record: E::NAME,
            type_id: TypeId::of::<E>(),
            field: field.into(),
        }
    }

    /// Name of the record type.
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether this references a field of `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record, self.field)
    }
}

/// Handle on one schema field of record type `E`.
///
/// Obtained from [`Event::descriptor`] / [`Event::descriptors`]; combine two
/// with [`FieldDescriptor::join`] or `&`.
pub struct FieldDescriptor<E> {
    field: String,
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> FieldDescriptor<E> {
    pub(crate) fn new(field: String) -> Self {
        Self {
            field,
            _event: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn field_ref(&self) -> FieldRef {
        FieldRef::of::<E>(self.field.clone())
    }

    /// Pair this field (left) with `other` (right).
    ///
    /// Only builds the expression; nothing checks that the two fields are
    /// comparable.
    pub fn join<R: Event>(&self, other: &FieldDescriptor<R>) -> JoinExpression {
        JoinExpression {
            left: self.field_ref(),
            right: other.field_ref(),
        }
    }
}

impl<E> Clone for FieldDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            _event: PhantomData,
        }
    }
}

impl<E> PartialEq for FieldDescriptor<E> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
    }
}

impl<E> Eq for FieldDescriptor<E> {}

impl<E: Event> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<FieldDescriptor: {}.{}>", E::NAME, self.field)
    }
}

impl<L: Event, R: Event> BitAnd<FieldDescriptor<R>> for FieldDescriptor<L> {
    type Output = JoinExpression;

    fn bitand(self, rhs: FieldDescriptor<R>) -> JoinExpression {
        self.join(&rhs)
    }
}

impl<'a, L: Event, R: Event> BitAnd<&'a FieldDescriptor<R>> for &'a FieldDescriptor<L> {
    type Output = JoinExpression;

    fn bitand(self, rhs: &'a FieldDescriptor<R>) -> JoinExpression {
        self.join(rhs)
    }
}

/// Directional field pairing consumed by a stream-join operator.
///
/// `left` and `right` keep the order they were built in; `a & b` and
/// `b & a` are different expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinExpression {
    left: FieldRef,
    right: FieldRef,
}

impl JoinExpression {
    pub fn new(left: FieldRef, right: FieldRef) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &FieldRef {
        &self.left
    }

    pub fn right(&self) -> &FieldRef {
        &self.right
    }

    pub fn reversed(&self) -> Self {
        Self {
            left: self.right.clone(),
            right: self.left.clone(),
        }
    }
}

impl fmt::Display for JoinExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}
