//! Ordered multi-value container.
//!
//! A [`ValueList`] holds any number of [`Value`]s in a stable order. The element at index 0 is
//! the *primary* value, the one returned when the list is read as a single value. Every mutation
//! emits a [`ListChange`] to the list's listeners, and to the owning
//! [`AttributeMap`](crate::AttributeMap) when the list belongs to one.

mod errors;

use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
    sync::Arc,
};

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use errors::ListError;

use crate::{
    Result,
    events::{ChangeKind, ListChange, Listener, ListenerId, Listeners},
    value::{FromValue, Opaque, Value},
};

/// An ordered list of heterogeneous values with a primary value at index 0.
///
/// # Equality and cloning
///
/// Two lists are equal when they hold equal elements in the same order. Listeners take no part
/// in equality, and a clone starts out with no listeners and no owner.
///
/// # Casting
///
/// The `cast*` family converts elements through [`FromValue`]. Each comes in a failing form and
/// a defaulting form:
///
/// ```
/// # use dynattr::ValueList;
/// let list = ValueList::from(["42", "x"]);
///
/// assert_eq!(list.cast::<i32>().unwrap(), 42);
/// assert!(list.cast_at::<i32>(1).unwrap_err().is_type_mismatch());
/// assert_eq!(list.cast_at_or(1, -1), -1);
/// assert_eq!(list.cast_list_or(0), vec![42, 0]);
/// assert_eq!(ValueList::new().cast::<i32>().unwrap(), 0);
/// ```
pub struct ValueList {
    items: Vec<Value>,
    listeners: Listeners<ListChange>,
    owner: Option<Listener<ListChange>>,
}

impl ValueList {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            listeners: Listeners::new(),
            owner: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if the list has a primary value.
    pub fn has_value(&self) -> bool {
        !self.items.is_empty()
    }

    /// The element at index 0, or `None` for an empty list.
    pub fn primary(&self) -> Option<&Value> {
        self.items.first()
    }

    /// Inserts `value` in front of the existing elements, making it the primary value.
    ///
    /// Nothing is replaced: the previous primary value moves to index 1.
    pub fn insert_primary(&mut self, value: impl Into<Value>) {
        let value = value.into();
        self.items.insert(0, value.clone());
        self.emit(ListChange::new(ChangeKind::Added, value));
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Like [`ValueList::get`], failing with [`ListError::IndexOutOfRange`].
    pub fn try_get(&self, index: usize) -> Result<&Value> {
        self.items
            .get(index)
            .ok_or_else(|| self.out_of_range(index).into())
    }

    /// Overwrites the element at `index` and returns the previous element.
    ///
    /// A `Changed` event is emitted only when the new value differs from the old one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(ListError::IndexOutOfRange { index, len })?;
        if slot.is_identical(&value) {
            return Ok(value);
        }
        let old = std::mem::replace(slot, value.clone());
        self.emit(ListChange::changed(value, old.clone()));
        Ok(old)
    }

    /// Appends a value.
    pub fn push(&mut self, value: impl Into<Value>) {
        let value = value.into();
        self.items.push(value.clone());
        self.emit(ListChange::new(ChangeKind::Added, value));
    }

    /// Inserts at `index`, shifting later elements. `index == len()` appends.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        if index > self.items.len() {
            return Err(self.out_of_range(index).into());
        }
        let value = value.into();
        self.items.insert(index, value.clone());
        self.emit(ListChange::new(ChangeKind::Added, value));
        Ok(())
    }

    /// Removes and returns the element at `index`; does nothing when out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.emit(ListChange::new(ChangeKind::Removed, removed.clone()));
        Some(removed)
    }

    /// Removes the first element equal to `value`. Returns whether anything was removed.
    pub fn remove<V>(&mut self, value: &V) -> bool
    where
        Value: PartialEq<V>,
        V: ?Sized,
    {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Removes one match for each of `values`, skipping values that aren't present.
    ///
    /// Returns how many elements were removed.
    pub fn remove_all<'a, I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .filter(|value| self.remove(*value))
            .count()
    }

    /// Moves the element at `index` to the front.
    ///
    /// Returns false, leaving the list untouched, when `index` is out of range.
    pub fn set_primary(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let value = self.items.remove(index);
        self.items.insert(0, value.clone());
        self.emit(ListChange::new(ChangeKind::Reordered, value));
        true
    }

    /// Moves the first element equal to `value` to the front.
    ///
    /// Returns false, leaving the list untouched, when no element matches.
    pub fn set_primary_value<V>(&mut self, value: &V) -> bool
    where
        Value: PartialEq<V>,
        V: ?Sized,
    {
        match self.index_of(value) {
            Some(index) => self.set_primary(index),
            None => false,
        }
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.items.clear();
        self.emit(ListChange::cleared());
    }

    pub fn contains<V>(&self, value: &V) -> bool
    where
        Value: PartialEq<V>,
        V: ?Sized,
    {
        self.items.iter().any(|item| item == value)
    }

    pub fn index_of<V>(&self, value: &V) -> Option<usize>
    where
        Value: PartialEq<V>,
        V: ?Sized,
    {
        self.items.iter().position(|item| item == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }

    // ===== Casting =====

    /// Converts the primary value. An empty list yields [`FromValue::empty`].
    pub fn cast<T: FromValue>(&self) -> Result<T> {
        match self.primary() {
            Some(value) => Ok(T::from_value(value)?),
            None => Ok(T::empty()),
        }
    }

    /// Converts the primary value, returning `default` if the list is empty or the value
    /// doesn't convert.
    pub fn cast_or<T: FromValue>(&self, default: T) -> T {
        match self.primary() {
            Some(value) => T::from_value(value).unwrap_or(default),
            None => default,
        }
    }

    /// Converts the element at `index`.
    pub fn cast_at<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.try_get(index)?;
        Ok(T::from_value(value)?)
    }

    /// Converts the element at `index`, returning `default` on any failure.
    pub fn cast_at_or<T: FromValue>(&self, index: usize, default: T) -> T {
        self.cast_at(index).unwrap_or(default)
    }

    /// Converts every element, stopping at the first failure.
    pub fn cast_list<T: FromValue>(&self) -> Result<Vec<T>> {
        self.items
            .iter()
            .map(|value| T::from_value(value).map_err(Into::into))
            .collect()
    }

    /// Converts every element, substituting `default` for elements that don't convert.
    pub fn cast_list_or<T: FromValue + Clone>(&self, default: T) -> Vec<T> {
        self.items
            .iter()
            .map(|value| T::from_value(value).unwrap_or_else(|_| default.clone()))
            .collect()
    }

    /// Converts the primary value. An empty list counts as success with [`FromValue::empty`].
    pub fn try_cast<T: FromValue>(&self) -> Option<T> {
        self.cast().ok()
    }

    pub fn try_cast_at<T: FromValue>(&self, index: usize) -> Option<T> {
        self.cast_at(index).ok()
    }

    /// Converts every element that can be converted.
    ///
    /// Returns `Ok` with all elements when every conversion succeeded, and `Err` with the
    /// elements that did convert, in order, otherwise.
    pub fn try_cast_list<T: FromValue>(&self) -> std::result::Result<Vec<T>, Vec<T>> {
        let mut converted = Vec::with_capacity(self.items.len());
        let mut complete = true;
        for value in &self.items {
            match T::from_value(value) {
                Ok(item) => converted.push(item),
                Err(_) => complete = false,
            }
        }
        if complete { Ok(converted) } else { Err(converted) }
    }

    // ===== Listeners =====

    /// Registers a listener for changes to this list.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ListChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Element-wise [`Value::is_identical`].
    pub fn is_identical(&self, other: &ValueList) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a.is_identical(b))
    }

    /// Installs the hook through which an owning map hears about changes.
    pub(crate) fn attach_owner(&mut self, owner: Listener<ListChange>) {
        self.owner = Some(owner);
    }

    pub(crate) fn detach_owner(&mut self) {
        self.owner = None;
    }

    pub(crate) fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    fn emit(&self, change: ListChange) {
        self.listeners.emit(&change);
        if let Some(owner) = &self.owner {
            owner(&change);
        }
    }

    fn out_of_range(&self, index: usize) -> ListError {
        ListError::IndexOutOfRange {
            index,
            len: self.items.len(),
        }
    }
}

impl Default for ValueList {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ValueList {
    fn clone(&self) -> Self {
        self.items.clone().into()
    }
}

impl PartialEq for ValueList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for ValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

/// Comma-separated elements, primary first.
impl fmt::Display for ValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValueList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ValueList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Appends each value, emitting one `Added` event per value in input order.
impl<V: Into<Value>> Extend<V> for ValueList {
    fn extend<I: IntoIterator<Item = V>>(&mut self, values: I) {
        for value in values {
            self.push(value);
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for ValueList {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
            ..Self::new()
        }
    }
}

impl<V: Into<Value>> From<Vec<V>> for ValueList {
    fn from(values: Vec<V>) -> Self {
        values.into_iter().collect()
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for ValueList {
    fn from(values: [V; N]) -> Self {
        values.into_iter().collect()
    }
}

impl From<&[Value]> for ValueList {
    fn from(values: &[Value]) -> Self {
        values.iter().cloned().collect()
    }
}

impl From<&ValueList> for ValueList {
    fn from(list: &ValueList) -> Self {
        list.clone()
    }
}

macro_rules! impl_single_value_list {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueList {
                fn from(value: $ty) -> Self {
                    std::iter::once(value).collect()
                }
            }
        )*
    };
}

impl_single_value_list! {
    Value, bool, char, String, &str, &String,
    i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
    Decimal, DateTime<FixedOffset>, DateTime<Utc>, TimeDelta, Uuid, Opaque,
}

// ===== Combinators =====

/// Appends every element of `rhs`.
impl AddAssign<&ValueList> for ValueList {
    fn add_assign(&mut self, rhs: &ValueList) {
        self.extend(rhs.iter().cloned());
    }
}

/// Appends every element of `rhs`; `None` leaves the list unchanged.
impl AddAssign<Option<&ValueList>> for ValueList {
    fn add_assign(&mut self, rhs: Option<&ValueList>) {
        if let Some(rhs) = rhs {
            *self += rhs;
        }
    }
}

impl AddAssign<Value> for ValueList {
    fn add_assign(&mut self, rhs: Value) {
        self.push(rhs);
    }
}

/// Removes one match for each element of `rhs`.
impl SubAssign<&ValueList> for ValueList {
    fn sub_assign(&mut self, rhs: &ValueList) {
        self.remove_all(rhs.iter());
    }
}

/// Removes one match for each element of `rhs`; `None` leaves the list unchanged.
impl SubAssign<Option<&ValueList>> for ValueList {
    fn sub_assign(&mut self, rhs: Option<&ValueList>) {
        if let Some(rhs) = rhs {
            *self -= rhs;
        }
    }
}

impl SubAssign<Value> for ValueList {
    fn sub_assign(&mut self, rhs: Value) {
        self.remove(&rhs);
    }
}

impl<Rhs> Add<Rhs> for ValueList
where
    ValueList: AddAssign<Rhs>,
{
    type Output = ValueList;

    fn add(mut self, rhs: Rhs) -> ValueList {
        self += rhs;
        self
    }
}

impl<Rhs> Sub<Rhs> for ValueList
where
    ValueList: SubAssign<Rhs>,
{
    type Output = ValueList;

    fn sub(mut self, rhs: Rhs) -> ValueList {
        self -= rhs;
        self
    }
}
