//! Security identifier and security-descriptor handling.
//!
//! Two post-creation steps need binary security structures:
//!
//! - primaryGroupID is the RID (last sub-authority) of the primary group's
//!   objectSid;
//! - the "user cannot change password" flag is a pair of object ACEs in the
//!   entry's DACL carrying the change-password control-access right GUID
//!   for the SELF and Everyone trustees — deny ACEs when the flag is set,
//!   allow ACEs when it is cleared.
//!
//! All structures are the self-relative little-endian wire forms returned
//! by the directory for objectSid and nTSecurityDescriptor.

use castellan_connector::error::{ConnectorError, ConnectorResult};

use crate::guid;

/// Control-access right for changing one's own password,
/// {ab721a53-1e2f-11d0-9819-00aa0040529b}.
pub const CHANGE_PASSWORD_GUID: &str = "ab721a53-1e2f-11d0-9819-00aa0040529b";

/// ADS_RIGHT_DS_CONTROL_ACCESS access mask bit.
const DS_CONTROL_ACCESS: u32 = 0x100;

/// ACE_OBJECT_TYPE_PRESENT flag in an object ACE.
const OBJECT_TYPE_PRESENT: u32 = 0x1;

const ACCESS_ALLOWED_OBJECT_ACE: u8 = 0x05;
const ACCESS_DENIED_OBJECT_ACE: u8 = 0x06;

/// Everyone (S-1-1-0) in wire form.
const EVERYONE_SID: [u8; 12] = [1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0];

/// NT AUTHORITY\SELF (S-1-5-10) in wire form.
const SELF_SID: [u8; 12] = [1, 1, 0, 0, 0, 0, 0, 5, 10, 0, 0, 0];

/// A parsed security identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sid {
    pub revision: u8,
    pub authority: u64,
    pub sub_authorities: Vec<u32>,
}

impl Sid {
    /// Parse a binary SID.
    pub fn parse(raw: &[u8]) -> ConnectorResult<Self> {
        if raw.len() < 8 {
            return Err(ConnectorError::invalid_input(format!(
                "SID too short: {} bytes",
                raw.len()
            )));
        }

        let revision = raw[0];
        let count = raw[1] as usize;
        let expected = 8 + count * 4;
        if raw.len() < expected {
            return Err(ConnectorError::invalid_input(format!(
                "SID truncated: expected {expected} bytes, got {}",
                raw.len()
            )));
        }

        // 48-bit identifier authority, big-endian.
        let authority = raw[2..8].iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);

        let sub_authorities = (0..count)
            .map(|i| {
                let off = 8 + i * 4;
                u32::from_le_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]])
            })
            .collect();

        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Wire length of a SID starting at the beginning of `raw`.
    fn wire_len(raw: &[u8]) -> ConnectorResult<usize> {
        if raw.len() < 2 {
            return Err(ConnectorError::invalid_input("SID too short"));
        }
        let len = 8 + raw[1] as usize * 4;
        if raw.len() < len {
            return Err(ConnectorError::invalid_input("SID truncated"));
        }
        Ok(len)
    }

    /// The relative identifier: the last sub-authority.
    pub fn rid(&self) -> ConnectorResult<u32> {
        self.sub_authorities
            .last()
            .copied()
            .ok_or_else(|| ConnectorError::invalid_input("SID has no sub-authorities"))
    }
}

impl std::fmt::Display for Sid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

/// Extract the RID from a binary objectSid, for primaryGroupID.
pub fn rid_from_object_sid(raw: &[u8]) -> ConnectorResult<u32> {
    Sid::parse(raw)?.rid()
}

/// Rewrite a self-relative security descriptor so that its DACL reflects the
/// "user cannot change password" flag.
///
/// Existing change-password object ACEs for SELF and Everyone are removed;
/// a fresh pair is inserted — deny ACEs (ahead of the remaining ACEs, in
/// canonical order) when `cannot_change` is set, allow ACEs (appended)
/// otherwise.
pub fn set_cannot_change_password(
    descriptor: &[u8],
    cannot_change: bool,
) -> ConnectorResult<Vec<u8>> {
    if descriptor.len() < 20 {
        return Err(ConnectorError::invalid_input(
            "security descriptor too short",
        ));
    }

    let revision = descriptor[0];
    let sbz1 = descriptor[1];
    let control = u16::from_le_bytes([descriptor[2], descriptor[3]]);
    let offset_owner = read_u32(descriptor, 4) as usize;
    let offset_group = read_u32(descriptor, 8) as usize;
    let offset_sacl = read_u32(descriptor, 12) as usize;
    let offset_dacl = read_u32(descriptor, 16) as usize;

    if offset_dacl == 0 || offset_dacl + 8 > descriptor.len() {
        return Err(ConnectorError::invalid_input(
            "security descriptor has no DACL",
        ));
    }

    let owner = sid_blob(descriptor, offset_owner)?;
    let group = sid_blob(descriptor, offset_group)?;
    let sacl = acl_blob(descriptor, offset_sacl)?;

    // Walk the existing DACL, keeping every ACE that is not a
    // change-password object ACE for one of our two trustees.
    let dacl = &descriptor[offset_dacl..];
    let acl_revision = dacl[0];
    let ace_count = u16::from_le_bytes([dacl[4], dacl[5]]) as usize;
    let change_password_guid = guid::encode_guid(CHANGE_PASSWORD_GUID)?;

    let mut kept: Vec<&[u8]> = Vec::new();
    let mut cursor = 8usize;
    for _ in 0..ace_count {
        if cursor + 4 > dacl.len() {
            return Err(ConnectorError::invalid_input("DACL truncated"));
        }
        let ace_size = u16::from_le_bytes([dacl[cursor + 2], dacl[cursor + 3]]) as usize;
        if ace_size < 4 || cursor + ace_size > dacl.len() {
            return Err(ConnectorError::invalid_input("DACL ACE size out of range"));
        }
        let ace = &dacl[cursor..cursor + ace_size];
        if !is_change_password_ace(ace, &change_password_guid) {
            kept.push(ace);
        }
        cursor += ace_size;
    }

    let self_ace = build_change_password_ace(cannot_change, &change_password_guid, &SELF_SID);
    let everyone_ace =
        build_change_password_ace(cannot_change, &change_password_guid, &EVERYONE_SID);

    let mut aces: Vec<Vec<u8>> = Vec::with_capacity(kept.len() + 2);
    if cannot_change {
        // Deny ACEs go first.
        aces.push(self_ace);
        aces.push(everyone_ace);
        aces.extend(kept.iter().map(|a| a.to_vec()));
    } else {
        aces.extend(kept.iter().map(|a| a.to_vec()));
        aces.push(self_ace);
        aces.push(everyone_ace);
    }

    let aces_len: usize = aces.iter().map(Vec::len).sum();
    let acl_size = 8 + aces_len;
    if acl_size > u16::MAX as usize || aces.len() > u16::MAX as usize {
        return Err(ConnectorError::invalid_input("rebuilt DACL too large"));
    }

    // Reassemble: header, owner, group, sacl, dacl.
    let mut out = Vec::with_capacity(20 + owner.len() + group.len() + sacl.len() + acl_size);
    out.extend_from_slice(&[revision, sbz1]);
    out.extend_from_slice(&control.to_le_bytes());

    let mut offset = 20u32;
    for blob in [&owner, &group, &sacl] {
        if blob.is_empty() {
            out.extend_from_slice(&0u32.to_le_bytes());
        } else {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += blob.len() as u32;
        }
    }
    out.extend_from_slice(&offset.to_le_bytes());

    out.extend_from_slice(&owner);
    out.extend_from_slice(&group);
    out.extend_from_slice(&sacl);

    out.push(acl_revision);
    out.push(0);
    out.extend_from_slice(&(acl_size as u16).to_le_bytes());
    out.extend_from_slice(&(aces.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for ace in &aces {
        out.extend_from_slice(ace);
    }

    Ok(out)
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Copy out the SID blob at `offset`, or empty when the offset is zero.
fn sid_blob(descriptor: &[u8], offset: usize) -> ConnectorResult<Vec<u8>> {
    if offset == 0 {
        return Ok(Vec::new());
    }
    if offset >= descriptor.len() {
        return Err(ConnectorError::invalid_input("SID offset out of range"));
    }
    let len = Sid::wire_len(&descriptor[offset..])?;
    Ok(descriptor[offset..offset + len].to_vec())
}

/// Copy out the ACL blob at `offset`, or empty when the offset is zero.
fn acl_blob(descriptor: &[u8], offset: usize) -> ConnectorResult<Vec<u8>> {
    if offset == 0 {
        return Ok(Vec::new());
    }
    if offset + 8 > descriptor.len() {
        return Err(ConnectorError::invalid_input("ACL offset out of range"));
    }
    let size = u16::from_le_bytes([descriptor[offset + 2], descriptor[offset + 3]]) as usize;
    if size < 8 || offset + size > descriptor.len() {
        return Err(ConnectorError::invalid_input("ACL size out of range"));
    }
    Ok(descriptor[offset..offset + size].to_vec())
}

/// Whether an ACE is a change-password object ACE for SELF or Everyone.
fn is_change_password_ace(ace: &[u8], change_password_guid: &[u8; 16]) -> bool {
    if ace.len() < 12 {
        return false;
    }
    let ace_type = ace[0];
    if ace_type != ACCESS_ALLOWED_OBJECT_ACE && ace_type != ACCESS_DENIED_OBJECT_ACE {
        return false;
    }
    let object_flags = read_u32(ace, 8);
    if object_flags & OBJECT_TYPE_PRESENT == 0 || ace.len() < 28 {
        return false;
    }
    if &ace[12..28] != change_password_guid {
        return false;
    }

    // SID starts after the object-type GUID (plus the inherited-type GUID
    // when present).
    let mut sid_off = 28;
    if object_flags & 0x2 != 0 {
        sid_off += 16;
    }
    let sid = &ace[sid_off.min(ace.len())..];
    sid.starts_with(&SELF_SID) || sid.starts_with(&EVERYONE_SID)
}

/// Build an allow/deny object ACE for the change-password right.
fn build_change_password_ace(deny: bool, guid: &[u8; 16], sid: &[u8]) -> Vec<u8> {
    let ace_type = if deny {
        ACCESS_DENIED_OBJECT_ACE
    } else {
        ACCESS_ALLOWED_OBJECT_ACE
    };
    let size = 4 + 4 + 4 + 16 + sid.len();

    let mut ace = Vec::with_capacity(size);
    ace.push(ace_type);
    ace.push(0); // AceFlags
    ace.extend_from_slice(&(size as u16).to_le_bytes());
    ace.extend_from_slice(&DS_CONTROL_ACCESS.to_le_bytes());
    ace.extend_from_slice(&OBJECT_TYPE_PRESENT.to_le_bytes());
    ace.extend_from_slice(guid);
    ace.extend_from_slice(sid);
    ace
}
