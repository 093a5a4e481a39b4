//! Query string construction for the audience manager `/id` endpoint.
use std::collections::BTreeMap;

use kit_common::identity::IdentityType;
use url::form_urlencoded::byte_serialize;

pub const D_MID_KEY: &str = "d_mid";
pub const D_VER_KEY: &str = "d_ver";
pub const D_ORGID_KEY: &str = "d_orgid";
pub const D_CID_KEY: &str = "d_cid";
pub const D_CID_IC_KEY: &str = "d_cid_ic";
pub const DCS_REGION_KEY: &str = "dcs_region";
pub const D_BLOB_KEY: &str = "d_blob";
pub const D_PLATFORM_KEY: &str = "d_ptfm";

pub const D_VER: &str = "2";
pub const PLATFORM: &str = "android";

/// Integration code for the push token customer id.
pub const PUSH_TOKEN_KEY: u32 = 20919;
/// Integration code for the advertising id customer id.
pub const ADVERTISING_ID_KEY: u32 = 20914;

/// Separator between an integration code and its value, already percent-encoded.
const CUSTOM_ID_SEPARATOR: &str = "%01";

/// The identity fields known at the moment a sync request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySnapshot {
    pub cloud_id: Option<String>,
    pub org_id: Option<String>,
    pub blob: Option<String>,
    pub region_hint: Option<String>,
    pub push_token: Option<String>,
    pub advertising_id: Option<String>,
    pub user_identities: BTreeMap<IdentityType, String>,
}

impl IdentitySnapshot {
    pub fn to_query_string(&self) -> String {
        build_query_string(self, PUSH_TOKEN_KEY, ADVERTISING_ID_KEY)
    }
}

/// Build the `/id` query string for `snapshot`.
///
/// Absent and empty fields never produce a parameter. Values are percent-encoded, so a value
/// can never introduce a parameter of its own.
pub fn build_query_string(
    snapshot: &IdentitySnapshot,
    push_token_key: u32,
    advertising_id_key: u32,
) -> String {
    let mut builder = QueryBuilder::default();

    builder
        .append(D_MID_KEY, snapshot.cloud_id.as_deref())
        .append(D_VER_KEY, Some(D_VER))
        .append(D_ORGID_KEY, snapshot.org_id.as_deref())
        .append_integration_code(advertising_id_key, snapshot.advertising_id.as_deref())
        .append_integration_code(push_token_key, snapshot.push_token.as_deref())
        .append(DCS_REGION_KEY, snapshot.region_hint.as_deref())
        .append(D_BLOB_KEY, snapshot.blob.as_deref())
        .append(D_PLATFORM_KEY, Some(PLATFORM));

    for (identity_type, value) in &snapshot.user_identities {
        if let Some(code) = identity_type.server_code() {
            builder.append_identity_code(code, Some(value));
        }
    }

    builder.finish()
}

#[derive(Debug, Default)]
struct QueryBuilder {
    query: String,
}

impl QueryBuilder {
    fn append(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.is_empty() => {
                let encoded: String = byte_serialize(value.as_bytes()).collect();
                self.push(key, &encoded)
            }
            _ => self,
        }
    }

    /// Customer id keyed by a numeric integration code.
    fn append_integration_code(&mut self, code: u32, value: Option<&str>) -> &mut Self {
        self.append_customer_id(D_CID_KEY, &code.to_string(), value)
    }

    /// Customer id keyed by a string integration code.
    fn append_identity_code(&mut self, code: &str, value: Option<&str>) -> &mut Self {
        self.append_customer_id(D_CID_IC_KEY, code, value)
    }

    fn append_customer_id(&mut self, key: &str, code: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.is_empty() && !code.is_empty() => {
                let pair = format!(
                    "{}{}{}",
                    byte_serialize(code.as_bytes()).collect::<String>(),
                    CUSTOM_ID_SEPARATOR,
                    byte_serialize(value.as_bytes()).collect::<String>(),
                );
                self.push(key, &pair)
            }
            _ => self,
        }
    }

    /// Append an already encoded pair.
    fn push(&mut self, key: &str, encoded: &str) -> &mut Self {
        if !self.query.is_empty() {
            self.query.push('&');
        }
        self.query.push_str(key);
        self.query.push('=');
        self.query.push_str(encoded);

        self
    }

    fn finish(self) -> String {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn tokens(query: &str) -> HashSet<&str> {
        query.split('&').collect()
    }

    #[test]
    fn test_query_for_customer_id_snapshot() {
        let snapshot = IdentitySnapshot {
            cloud_id: Some("M1".to_owned()),
            org_id: Some("O1".to_owned()),
            user_identities: BTreeMap::from([(IdentityType::CustomerId, "C1".to_owned())]),
            ..Default::default()
        };

        let query = snapshot.to_query_string();

        assert_eq!(
            tokens(&query),
            HashSet::from([
                "d_mid=M1",
                "d_ver=2",
                "d_orgid=O1",
                "d_ptfm=android",
                "d_cid_ic=customerid%01C1",
            ])
        );
    }

    #[test]
    fn test_query_with_every_field() {
        let snapshot = IdentitySnapshot {
            cloud_id: Some("M1".to_owned()),
            org_id: Some("O1".to_owned()),
            blob: Some("B1".to_owned()),
            region_hint: Some("9".to_owned()),
            push_token: Some("P1".to_owned()),
            advertising_id: Some("G1".to_owned()),
            user_identities: BTreeMap::from([
                (IdentityType::Email, "a@b.c".to_owned()),
                (IdentityType::Other, "X".to_owned()),
            ]),
        };

        let query = snapshot.to_query_string();

        assert_eq!(
            tokens(&query),
            HashSet::from([
                "d_mid=M1",
                "d_ver=2",
                "d_orgid=O1",
                "d_cid=20914%01G1",
                "d_cid=20919%01P1",
                "dcs_region=9",
                "d_blob=B1",
                "d_ptfm=android",
                "d_cid_ic=email%01a%40b.c",
                "d_cid_ic=other%01X",
            ])
        );
        assert_eq!(query.split('&').count(), 10);
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let snapshot = IdentitySnapshot {
            cloud_id: Some(String::new()),
            org_id: None,
            blob: Some(String::new()),
            push_token: Some(String::new()),
            user_identities: BTreeMap::from([(IdentityType::Google, String::new())]),
            ..Default::default()
        };

        let query = snapshot.to_query_string();

        assert_eq!(tokens(&query), HashSet::from(["d_ver=2", "d_ptfm=android"]));
        assert!(!query.contains("=&"));
        assert!(!query.ends_with('='));
    }

    #[test]
    fn test_identities_without_server_code_are_skipped() {
        let snapshot = IdentitySnapshot {
            user_identities: BTreeMap::from([
                (IdentityType::MobileNumber, "555".to_owned()),
                (IdentityType::Yahoo, "Y1".to_owned()),
            ]),
            ..Default::default()
        };

        let query = snapshot.to_query_string();

        assert!(tokens(&query).contains("d_cid_ic=yahoo%01Y1"));
        assert!(!query.contains("555"));
    }

    #[test]
    fn test_values_cannot_inject_parameters() {
        let snapshot = IdentitySnapshot {
            blob: Some("x=1&y 2".to_owned()),
            user_identities: BTreeMap::from([(
                IdentityType::Email,
                "a+b@x.com&d_mid=EVIL".to_owned(),
            )]),
            ..Default::default()
        };

        let query = snapshot.to_query_string();

        assert_eq!(
            tokens(&query),
            HashSet::from([
                "d_ver=2",
                "d_blob=x%3D1%26y+2",
                "d_ptfm=android",
                "d_cid_ic=email%01a%2Bb%40x.com%26d_mid%3DEVIL",
            ])
        );
        assert_eq!(query.split('&').count(), 4);
        assert!(!query.contains("d_mid="));
    }

    #[test]
    fn test_custom_integration_codes() {
        let snapshot = IdentitySnapshot {
            push_token: Some("P1".to_owned()),
            advertising_id: Some("G1".to_owned()),
            ..Default::default()
        };

        let query = build_query_string(&snapshot, 1, 2);

        assert!(tokens(&query).contains("d_cid=1%01P1"));
        assert!(tokens(&query).contains("d_cid=2%01G1"));
    }
}
