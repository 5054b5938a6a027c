//! The list-merge protocol.
//!
//! Pure operations over the nested sub-entity lists of a parent document:
//!
//! - `upsert`: insert-or-replace by identity key, shifting sibling `order`
//!   values forward when a positioned entity lands on an occupied slot
//! - `patch`: shallow field merge over the element matching the identity key
//! - `remove`: drop the element matching the identity key
//! - `remove_matching_invites`: drop invites matching a member by email or
//!   user id
//!
//! Missing elements are silent no-ops for `patch` and `remove`; a duplicate
//! `upsert` replaces the stored element in place. Both behaviors repair
//! previously inconsistent indexing instead of erroring on it.

use serde_json::Value;

/// Which payload field identifies a sub-entity within its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    /// Numeric `id`.
    Id,
    /// String `key` (project types, product categories).
    Key,
}

impl IdentityField {
    pub fn name(self) -> &'static str {
        match self {
            IdentityField::Id => "id",
            IdentityField::Key => "key",
        }
    }
}

/// Interpret a document field as a list, treating absent or non-list values
/// as empty.
pub fn take_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn identity_of(entry: &Value, identity: IdentityField) -> Option<&Value> {
    match entry.get(identity.name()) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

fn position_of(list: &[Value], identity: IdentityField, key: &Value) -> Option<usize> {
    list.iter()
        .position(|entry| identity_of(entry, identity) == Some(key))
}

/// Insert `payload` into `list`, keyed by `identity`.
///
/// When no element carries the payload's identity key, the payload is
/// appended; a positioned insert first shifts every sibling whose `order` is
/// greater than or equal to the payload's `order` forward by one, so landing
/// on an occupied slot pushes the incumbents back. When an element with the
/// key already exists the payload replaces it in place.
pub fn upsert(list: &mut Vec<Value>, payload: Value, identity: IdentityField, positioned: bool) {
    let Some(key) = identity_of(&payload, identity).cloned() else {
        // No identity on the payload; nothing to match against.
        list.push(payload);
        return;
    };

    match position_of(list, identity, &key) {
        None => {
            if positioned {
                if let Some(inserted_order) = payload.get("order").and_then(Value::as_i64) {
                    for sibling in list.iter_mut() {
                        let Some(order) = sibling.get("order").and_then(Value::as_i64) else {
                            continue;
                        };
                        if order >= inserted_order {
                            sibling["order"] = Value::from(order + 1);
                        }
                    }
                }
            }
            list.push(payload);
        }
        Some(index) => list[index] = payload,
    }
}

/// Shallow-merge `payload`'s fields over the element matching its identity
/// key. Elements that do not match pass through unchanged; no match at all
/// leaves the list untouched.
pub fn patch(list: &mut [Value], payload: &Value, identity: IdentityField) {
    let Some(key) = identity_of(payload, identity) else {
        return;
    };
    if let Some(index) = position_of(list, identity, key) {
        shallow_merge(&mut list[index], payload);
    }
}

/// Remove the element matching `payload`'s identity key. Absence is a
/// silent no-op.
pub fn remove(list: &mut Vec<Value>, payload: &Value, identity: IdentityField) {
    let Some(key) = identity_of(payload, identity) else {
        return;
    };
    list.retain(|entry| identity_of(entry, identity) != Some(key));
}

/// Merge `incoming`'s top-level fields into `target`. Fields absent from
/// `incoming` survive.
pub fn shallow_merge(target: &mut Value, incoming: &Value) {
    match (target.as_object_mut(), incoming.as_object()) {
        (Some(target), Some(fields)) => {
            for (name, value) in fields {
                target.insert(name.clone(), value.clone());
            }
        }
        _ => *target = incoming.clone(),
    }
}

/// Remove every invite matching `email` or `user_id`, returning the removed
/// invites so the caller can log each one.
///
/// An invite matches when the member carries an email equal to the invite's
/// email, or a user id equal to the invite's user id. Null and missing
/// fields never match.
pub fn remove_matching_invites(
    invites: &mut Vec<Value>,
    email: Option<&Value>,
    user_id: Option<&Value>,
) -> Vec<Value> {
    let email = email.filter(|v| !v.is_null());
    let user_id = user_id.filter(|v| !v.is_null());

    let mut removed = Vec::new();
    invites.retain(|invite| {
        let email_match = match (email, invite.get("email")) {
            (Some(member), Some(invite)) if !invite.is_null() => member == invite,
            _ => false,
        };
        let user_match = match (user_id, invite.get("userId")) {
            (Some(member), Some(invite)) if !invite.is_null() => member == invite,
            _ => false,
        };
        if email_match || user_match {
            removed.push(invite.clone());
            false
        } else {
            true
        }
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phases() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "spec", "order": 1}),
            json!({"id": 2, "name": "build", "order": 2}),
            json!({"id": 3, "name": "ship", "order": 4}),
        ]
    }

    #[test]
    fn test_upsert_appends_new_element() {
        let mut list = phases();
        upsert(&mut list, json!({"id": 9, "order": 10}), IdentityField::Id, true);
        assert_eq!(list.len(), 4);
        assert_eq!(list[3]["id"], json!(9));
    }

    #[test]
    fn test_positioned_upsert_shifts_equal_and_greater_orders() {
        let mut list = phases();
        upsert(&mut list, json!({"id": 9, "order": 2}), IdentityField::Id, true);

        // order 1 untouched, orders 2 and 4 shifted forward by exactly one
        assert_eq!(list[0]["order"], json!(1));
        assert_eq!(list[1]["order"], json!(3));
        assert_eq!(list[2]["order"], json!(5));
        assert_eq!(list[3], json!({"id": 9, "order": 2}));
    }

    #[test]
    fn test_positioned_upsert_ignores_siblings_without_order() {
        let mut list = vec![json!({"id": 1}), json!({"id": 2, "order": 3})];
        upsert(&mut list, json!({"id": 9, "order": 1}), IdentityField::Id, true);
        assert_eq!(list[0], json!({"id": 1}));
        assert_eq!(list[1]["order"], json!(4));
    }

    #[test]
    fn test_positioned_upsert_without_payload_order_shifts_nothing() {
        let mut list = phases();
        upsert(&mut list, json!({"id": 9}), IdentityField::Id, true);
        assert_eq!(list[0]["order"], json!(1));
        assert_eq!(list[1]["order"], json!(2));
        assert_eq!(list[2]["order"], json!(4));
    }

    #[test]
    fn test_unpositioned_upsert_never_renumbers() {
        let mut list = phases();
        upsert(&mut list, json!({"id": 9, "order": 1}), IdentityField::Id, false);
        assert_eq!(list[0]["order"], json!(1));
        assert_eq!(list[1]["order"], json!(2));
    }

    #[test]
    fn test_duplicate_upsert_replaces_in_place() {
        let mut list = phases();
        upsert(
            &mut list,
            json!({"id": 2, "name": "rebuild", "order": 7}),
            IdentityField::Id,
            true,
        );
        assert_eq!(list.len(), 3);
        assert_eq!(list[1], json!({"id": 2, "name": "rebuild", "order": 7}));
        // replacement does not renumber siblings
        assert_eq!(list[2]["order"], json!(4));
    }

    #[test]
    fn test_upsert_by_string_key() {
        let mut list = vec![json!({"key": "generic", "displayName": "Generic"})];
        upsert(
            &mut list,
            json!({"key": "generic", "displayName": "Generic v2"}),
            IdentityField::Key,
            false,
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["displayName"], json!("Generic v2"));
    }

    #[test]
    fn test_patch_merges_fields_and_keeps_missing_ones() {
        let mut list = phases();
        patch(&mut list, &json!({"id": 2, "name": "renamed"}), IdentityField::Id);
        assert_eq!(list[1]["name"], json!("renamed"));
        assert_eq!(list[1]["order"], json!(2));
    }

    #[test]
    fn test_patch_of_missing_key_is_a_no_op() {
        let mut list = phases();
        let before = list.clone();
        patch(&mut list, &json!({"id": 99, "name": "ghost"}), IdentityField::Id);
        assert_eq!(list, before);
    }

    #[test]
    fn test_remove_drops_matching_element() {
        let mut list = phases();
        remove(&mut list, &json!({"id": 2}), IdentityField::Id);
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|p| p["id"] != json!(2)));
    }

    #[test]
    fn test_remove_of_missing_key_is_a_no_op() {
        let mut list = phases();
        let before = list.clone();
        remove(&mut list, &json!({"id": 99}), IdentityField::Id);
        assert_eq!(list, before);
    }

    #[test]
    fn test_take_list_treats_absent_and_non_list_as_empty() {
        assert!(take_list(None).is_empty());
        assert!(take_list(Some(json!("oops"))).is_empty());
        assert_eq!(take_list(Some(json!([1]))), vec![json!(1)]);
    }

    #[test]
    fn test_remove_matching_invites_by_email() {
        let mut invites = vec![
            json!({"id": 5, "email": "a@x.com"}),
            json!({"id": 6, "email": "b@x.com"}),
        ];
        let removed =
            remove_matching_invites(&mut invites, Some(&json!("a@x.com")), Some(&json!(9)));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0]["id"], json!(5));
        assert_eq!(invites.len(), 1);
    }

    #[test]
    fn test_remove_matching_invites_by_user_id() {
        let mut invites = vec![json!({"id": 5, "userId": 9}), json!({"id": 6, "userId": 10})];
        let removed = remove_matching_invites(&mut invites, None, Some(&json!(9)));
        assert_eq!(removed.len(), 1);
        assert_eq!(invites, vec![json!({"id": 6, "userId": 10})]);
    }

    #[test]
    fn test_remove_matching_invites_ignores_null_fields() {
        let mut invites = vec![json!({"id": 5, "email": null, "userId": null})];
        let removed =
            remove_matching_invites(&mut invites, Some(&Value::Null), Some(&Value::Null));
        assert!(removed.is_empty());
        assert_eq!(invites.len(), 1);
    }
}
