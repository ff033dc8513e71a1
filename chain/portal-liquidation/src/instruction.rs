use serde::Serialize;

/// The four-string tuple every liquidation pass emits:
/// `[meta_type, shard_id, status, content]`, with `content` a JSON-encoded
/// payload specific to `meta_type`. Field order inside each payload struct
/// is its declaration order, and `serde_json` never reorders object keys,
/// so two validators serializing the same payload produce byte-identical
/// JSON. Field names and meta-type/status wire strings are pinned to
/// SPEC_FULL.md §6 exactly — they are compared byte-for-byte across
/// validators, not just Rust-internal identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub meta_type: MetaType,
    pub shard_id: String,
    pub status: Status,
    pub content: String,
}

impl Instruction {
    pub fn new(meta_type: MetaType, shard_id: impl Into<String>, status: Status, content: impl Serialize) -> Self {
        let content = serde_json::to_string(&content).expect("liquidation payloads are always serializable");
        Self { meta_type, shard_id: shard_id.into(), status, content }
    }

    pub fn to_tuple(&self) -> [String; 4] {
        [
            self.meta_type.as_str().to_string(),
            self.shard_id.clone(),
            self.status.as_str().to_string(),
            self.content.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, Serialize)]
#[serde(into = "&'static str")]
pub enum MetaType {
    #[strum(serialize = "LiquidateCustodian")]
    LiquidateCustodian,
    #[strum(serialize = "LiquidateTPExchangeRates")]
    LiquidateTpExchangeRates,
    #[strum(serialize = "RedeemLiquidateExchangeRates")]
    RedeemLiquidateExchangeRates,
    #[strum(serialize = "LiquidationCustodianDeposit")]
    LiquidationCustodianDeposit,
    #[strum(serialize = "ExpiredWaitingPortingReq")]
    ExpiredWaitingPortingReq,
}

impl MetaType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, Serialize)]
#[serde(into = "&'static str")]
pub enum Status {
    #[strum(serialize = "Success")]
    Success,
    #[strum(serialize = "Failed")]
    Failed,
    #[strum(serialize = "Rejected")]
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// `{UniqueRedeemID, TokenID, RedeemPubTokenAmount, MintedCollateralAmount,
/// RedeemerIncAddressStr, CustodianIncAddressStr, ShardID}` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidateCustodianContent {
    #[serde(rename = "UniqueRedeemID")]
    pub unique_redeem_id: String,
    #[serde(rename = "TokenID")]
    pub token_id: String,
    #[serde(rename = "RedeemPubTokenAmount")]
    pub redeem_pub_token_amount: u64,
    #[serde(rename = "MintedCollateralAmount")]
    pub minted_collateral_amount: u64,
    #[serde(rename = "RedeemerIncAddressStr")]
    pub redeemer_inc_address_str: String,
    #[serde(rename = "CustodianIncAddressStr")]
    pub custodian_inc_address_str: String,
    #[serde(rename = "ShardID")]
    pub shard_id: String,
}

/// `{UniquePortingID, ShardID}` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiredWaitingPortingReqContent {
    #[serde(rename = "UniquePortingID")]
    pub unique_porting_id: String,
    #[serde(rename = "ShardID")]
    pub shard_id: String,
}

/// `{CustodianAddress, MetaType, Status}` (§6); the instruction's own
/// `shard_id` slot is always the literal `"-1"` for this meta type. The
/// content's `MetaType` field carries which TP bucket triggered the entry
/// (`"TP120"`/`"TP130"`), and `Status` mirrors the outer tuple status —
/// the schema is self-describing by design, distinct from the outer
/// `[meta_type, shard_id, status, content]` tuple fields of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidateTpExchangeRatesContent {
    #[serde(rename = "CustodianAddress")]
    pub custodian_address: String,
    #[serde(rename = "MetaType")]
    pub meta_type: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// `{TokenID, RedeemAmount, RedeemerIncAddressStr, RemoteAddress,
/// RedeemFee, TxReqID, ShardID, TotalPTokenReceived}` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemLiquidateExchangeRatesContent {
    #[serde(rename = "TokenID")]
    pub token_id: String,
    #[serde(rename = "RedeemAmount")]
    pub redeem_amount: u64,
    #[serde(rename = "RedeemerIncAddressStr")]
    pub redeemer_inc_address_str: String,
    #[serde(rename = "RemoteAddress")]
    pub remote_address: String,
    #[serde(rename = "RedeemFee")]
    pub redeem_fee: u64,
    #[serde(rename = "TxReqID")]
    pub tx_req_id: String,
    #[serde(rename = "ShardID")]
    pub shard_id: String,
    #[serde(rename = "TotalPTokenReceived")]
    pub total_ptoken_received: u64,
}

/// `{PTokenId, IncogAddressStr, DepositedAmount, FreeCollateralSelected,
/// TxReqID, ShardID}` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidationCustodianDepositContent {
    #[serde(rename = "PTokenId")]
    pub ptoken_id: String,
    #[serde(rename = "IncogAddressStr")]
    pub incog_address_str: String,
    #[serde(rename = "DepositedAmount")]
    pub deposited_amount: u64,
    #[serde(rename = "FreeCollateralSelected")]
    pub free_collateral_selected: bool,
    #[serde(rename = "TxReqID")]
    pub tx_req_id: String,
    #[serde(rename = "ShardID")]
    pub shard_id: String,
}
