// src/store.rs - In-memory record store
//
// Four independent id-keyed maps, one per entity type. No persistence, no
// indexes, no uniqueness checks beyond key identity; filters are full linear
// scans and concurrent writers to the same key are last-writer-wins.
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::models::{Creator, IPAsset, LicensingAgreement, LicensingRequest};

#[derive(Default)]
pub struct RecordStore {
    creators: RwLock<HashMap<String, Creator>>,
    ip_assets: RwLock<HashMap<String, IPAsset>>,
    licensing_requests: RwLock<HashMap<String, LicensingRequest>>,
    licensing_agreements: RwLock<HashMap<String, LicensingAgreement>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Creators

    pub fn create_creator(&self, creator: Creator) -> Creator {
        let mut creators = self.creators.write().expect("creators lock poisoned");
        creators.insert(creator.id.clone(), creator.clone());
        creator
    }

    pub fn get_creator(&self, id: &str) -> Option<Creator> {
        let creators = self.creators.read().expect("creators lock poisoned");
        creators.get(id).cloned()
    }

    /// First match by wallet address, case-insensitive. One creator per
    /// address is assumed but not enforced.
    pub fn get_creator_by_address(&self, address: &str) -> Option<Creator> {
        let creators = self.creators.read().expect("creators lock poisoned");
        creators
            .values()
            .find(|c| c.wallet_address.eq_ignore_ascii_case(address))
            .cloned()
    }

    // IP assets

    pub fn create_ip_asset(&self, asset: IPAsset) -> IPAsset {
        let mut assets = self.ip_assets.write().expect("ip_assets lock poisoned");
        assets.insert(asset.id.clone(), asset.clone());
        asset
    }

    pub fn get_ip_asset(&self, id: &str) -> Option<IPAsset> {
        let assets = self.ip_assets.read().expect("ip_assets lock poisoned");
        assets.get(id).cloned()
    }

    pub fn get_ip_assets_by_creator(&self, creator_id: &str) -> Vec<IPAsset> {
        let assets = self.ip_assets.read().expect("ip_assets lock poisoned");
        assets
            .values()
            .filter(|a| a.creator_id == creator_id)
            .cloned()
            .collect()
    }

    pub fn get_all_ip_assets(&self) -> Vec<IPAsset> {
        let assets = self.ip_assets.read().expect("ip_assets lock poisoned");
        assets.values().cloned().collect()
    }

    // Licensing requests

    pub fn create_licensing_request(&self, request: LicensingRequest) -> LicensingRequest {
        let mut requests = self
            .licensing_requests
            .write()
            .expect("licensing_requests lock poisoned");
        requests.insert(request.id.clone(), request.clone());
        request
    }

    pub fn get_licensing_request(&self, id: &str) -> Option<LicensingRequest> {
        let requests = self
            .licensing_requests
            .read()
            .expect("licensing_requests lock poisoned");
        requests.get(id).cloned()
    }

    /// Requests targeting any of the creator's assets.
    pub fn get_licensing_requests_by_creator(&self, creator_id: &str) -> Vec<LicensingRequest> {
        let asset_ids: HashSet<String> = self
            .get_ip_assets_by_creator(creator_id)
            .into_iter()
            .map(|a| a.id)
            .collect();

        let requests = self
            .licensing_requests
            .read()
            .expect("licensing_requests lock poisoned");
        requests
            .values()
            .filter(|r| asset_ids.contains(&r.ip_asset_id))
            .cloned()
            .collect()
    }

    // Licensing agreements

    pub fn create_licensing_agreement(&self, agreement: LicensingAgreement) -> LicensingAgreement {
        let mut agreements = self
            .licensing_agreements
            .write()
            .expect("licensing_agreements lock poisoned");
        agreements.insert(agreement.id.clone(), agreement.clone());
        agreement
    }

    pub fn get_licensing_agreement(&self, id: &str) -> Option<LicensingAgreement> {
        let agreements = self
            .licensing_agreements
            .read()
            .expect("licensing_agreements lock poisoned");
        agreements.get(id).cloned()
    }

    pub fn get_licensing_agreements_by_creator(&self, creator_address: &str) -> Vec<LicensingAgreement> {
        let agreements = self
            .licensing_agreements
            .read()
            .expect("licensing_agreements lock poisoned");
        agreements
            .values()
            .filter(|a| a.creator_address.eq_ignore_ascii_case(creator_address))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgreementStatus, ContentAnalysis, ContentType, LicensingTerms, QualityTier, RequestStatus,
        SuggestedPricing, UsageRights,
    };

    fn creator(id: &str, address: &str) -> Creator {
        Creator {
            id: id.to_string(),
            wallet_address: address.to_string(),
            name: "Asha Rao".to_string(),
            bio: String::new(),
            location: String::new(),
            language: "en".to_string(),
            created_at: 1_700_000_000_000,
        }
    }

    fn terms() -> LicensingTerms {
        LicensingTerms {
            usage_rights: UsageRights::Commercial,
            derivatives: false,
            territory: vec!["US".to_string()],
            duration: 365,
            price: 150.0,
        }
    }

    fn asset(id: &str, creator_id: &str) -> IPAsset {
        IPAsset {
            id: id.to_string(),
            creator_id: creator_id.to_string(),
            token_id: "1".to_string(),
            title: "Test Asset".to_string(),
            description: String::new(),
            file_url: "ipfs://mock-hash-1".to_string(),
            file_type: "image/png".to_string(),
            content_hash: "deadbeef".to_string(),
            analysis: ContentAnalysis {
                content_type: ContentType::Image,
                quality: QualityTier::Medium,
                duration: None,
                genre: None,
                estimated_value: 100.0,
                suggested_pricing: SuggestedPricing {
                    commercial: 150.0,
                    non_commercial: 50.0,
                    exclusive: 1000.0,
                },
                tags: Vec::new(),
            },
            licensing_terms: terms(),
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn create_then_get_returns_equal_creator() {
        let store = RecordStore::new();
        let original = creator("c1", "0xabc");

        store.create_creator(original.clone());

        assert_eq!(store.get_creator("c1"), Some(original));
    }

    #[test]
    fn address_lookup_is_case_insensitive() {
        let store = RecordStore::new();
        store.create_creator(creator("c1", "0xabc"));

        let found = store.get_creator_by_address("0xABC");
        assert_eq!(found.map(|c| c.id), Some("c1".to_string()));
        assert!(store.get_creator_by_address("0xdef").is_none());
    }

    #[test]
    fn insert_is_replace_by_id() {
        let store = RecordStore::new();
        store.create_creator(creator("c1", "0xabc"));

        let mut renamed = creator("c1", "0xabc");
        renamed.name = "A. Rao".to_string();
        store.create_creator(renamed);

        assert_eq!(store.get_creator("c1").map(|c| c.name), Some("A. Rao".to_string()));
    }

    #[test]
    fn creator_with_no_assets_yields_empty_vec() {
        let store = RecordStore::new();
        store.create_creator(creator("c1", "0xabc"));

        assert!(store.get_ip_assets_by_creator("c1").is_empty());
        assert!(store.get_licensing_requests_by_creator("c1").is_empty());
    }

    #[test]
    fn dangling_creator_reference_is_tolerated() {
        let store = RecordStore::new();
        store.create_ip_asset(asset("a1", "ghost-creator"));

        // The asset is reachable; filtering by an unknown creator just
        // returns the matching (possibly dangling) rows.
        assert_eq!(store.get_ip_assets_by_creator("ghost-creator").len(), 1);
        assert!(store.get_creator("ghost-creator").is_none());
    }

    #[test]
    fn requests_filter_by_creator_via_asset_ids() {
        let store = RecordStore::new();
        store.create_creator(creator("c1", "0xabc"));
        store.create_ip_asset(asset("a1", "c1"));
        store.create_ip_asset(asset("a2", "someone-else"));

        for (id, asset_id) in [("r1", "a1"), ("r2", "a2")] {
            store.create_licensing_request(LicensingRequest {
                id: id.to_string(),
                ip_asset_id: asset_id.to_string(),
                licensee_address: "0xbuyer".to_string(),
                requested_terms: terms(),
                status: RequestStatus::Pending,
                negotiation_history: Vec::new(),
                created_at: 1_700_000_000_000,
            });
        }

        let mine = store.get_licensing_requests_by_creator("c1");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "r1");
        assert_eq!(store.get_licensing_request("r2").map(|r| r.ip_asset_id), Some("a2".to_string()));
    }

    #[test]
    fn agreements_filter_by_creator_address_case_insensitively() {
        let store = RecordStore::new();
        store.create_licensing_agreement(LicensingAgreement {
            id: "g1".to_string(),
            request_id: "r1".to_string(),
            ip_asset_id: "a1".to_string(),
            creator_address: "0xAbC".to_string(),
            licensee_address: "0xbuyer".to_string(),
            terms: terms(),
            contract_text: "contract".to_string(),
            contract_hash: "deadbeef".to_string(),
            status: AgreementStatus::Active,
            created_at: 1_700_000_000_000,
            expires_at: 1_800_000_000_000,
        });

        assert_eq!(store.get_licensing_agreements_by_creator("0xabc").len(), 1);
        assert_eq!(store.get_licensing_agreement("g1").map(|a| a.id), Some("g1".to_string()));
        assert!(store.get_licensing_agreements_by_creator("0xother").is_empty());
    }
}
