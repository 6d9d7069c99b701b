use crate::model::{FileEntry, Identity};

/// Whether `who` may view metadata, rename, delete or manage sharing for an
/// entry: administrators and the owner, nobody else.
pub fn can_manage(entry: &FileEntry, who: &Identity) -> bool {
    who.is_admin || entry.owner_id == who.id
}
