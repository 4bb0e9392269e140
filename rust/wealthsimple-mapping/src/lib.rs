mod amount;
pub use amount::{parse_amount, ParsedNumber};

pub mod broker;

mod description;
pub use description::{
    Description, DividendDescription, ParseDescription, WithholdingTaxDescription,
};

mod errors;
pub use errors::{MappingError, SnapshotError, TaggingIssue};

mod ledger;
pub use ledger::{
    AccountName, AccountType, Amount, Balance, Commodity, Cost, Flag, LedgerAccount,
    LedgerSnapshot, Metadata, Posting, Price, Transaction,
};

mod lookup;
pub use lookup::{FixedTolerance, LedgerLookup, Tolerance};

mod mapper;
pub use mapper::Mapper;

mod merge;
pub use merge::merge_withholding_tax;

pub mod options;
pub use options::{MappingOptions, MetadataKeys};

mod positions;
pub use positions::map_positions;

mod transaction;
pub use transaction::map_transaction;
