pub const DEFAULT_NPI_API_BASE_URL: &str = "https://npiregistry.cms.hhs.gov/api/";
pub const DEFAULT_NPI_API_VERSION: &str = "2.1";
pub const DEFAULT_EXA_SEARCH_URL: &str = "https://api.exa.ai/search";

/// Value shipped in sample env files; treated the same as no key at all.
pub const EXA_API_KEY_PLACEHOLDER: &str = "your_exa_api_key_here";

pub const USER_AGENT: &str = concat!("npi-lookup/", env!("CARGO_PKG_VERSION"));
