//! Ownership rule shared by every mutating operation on posts, comments and
//! profiles: the record must exist and belong to the caller.

use uuid::Uuid;

use crate::error::AppError;

/// Records that carry an immutable owner.
pub trait Owned {
    fn owner_id(&self) -> &Uuid;

    /// Used in log lines and the `NotFound` message.
    const RESOURCE: &'static str;
}

pub fn check_ownership<T, F>(
    record: Option<T>,
    caller: &Uuid,
    resource: &'static str,
    owner_of: F,
) -> Result<T, AppError>
where
    F: Fn(&T) -> &Uuid,
{
    let record = record.ok_or(AppError::NotFound(resource))?;
    // 以规范字符串形式比较（Uuid 的相等与其连字符小写形式的相等等价）
    if owner_of(&record) != caller {
        tracing::debug!("Account {} denied access to {}", caller, resource);
        return Err(AppError::Forbidden);
    }
    Ok(record)
}

pub fn ensure_owner<T: Owned>(record: Option<T>, caller: &Uuid) -> Result<T, AppError> {
    check_ownership(record, caller, T::RESOURCE, T::owner_id)
}
