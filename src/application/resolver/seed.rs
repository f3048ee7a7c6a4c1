/// Built-in aliases registered ahead of the persistent alias source.
/// They keep the resolver useful when the source cannot be read.
pub const SEED_ALIASES: &[(&str, &str)] = &[
    ("Apple", "AAPL"),
    ("Microsoft", "MSFT"),
    ("Alphabet", "GOOGL"),
    ("Google", "GOOGL"),
    ("Amazon", "AMZN"),
    ("Meta Platforms", "META"),
    ("Meta", "META"),
    ("Facebook", "META"),
    ("Tesla", "TSLA"),
    ("Nvidia", "NVDA"),
    ("Berkshire Hathaway", "BRK-B"),
    ("JPMorgan Chase", "JPM"),
    ("JPMorgan", "JPM"),
    ("Johnson & Johnson", "JNJ"),
    ("Visa", "V"),
    ("Mastercard", "MA"),
    ("Walmart", "WMT"),
    ("Procter & Gamble", "PG"),
    ("Exxon Mobil", "XOM"),
    ("Exxon", "XOM"),
    ("Chevron", "CVX"),
    ("Netflix", "NFLX"),
    ("Intel", "INTC"),
    ("Advanced Micro Devices", "AMD"),
    ("AMD", "AMD"),
    ("Coca-Cola", "KO"),
    ("PepsiCo", "PEP"),
    ("Walt Disney", "DIS"),
    ("Disney", "DIS"),
    ("International Business Machines", "IBM"),
    ("IBM", "IBM"),
    ("Oracle", "ORCL"),
    ("Salesforce", "CRM"),
    ("Adobe", "ADBE"),
    ("Cisco Systems", "CSCO"),
    ("Cisco", "CSCO"),
    ("Bank of America", "BAC"),
    ("Pfizer", "PFE"),
    ("Home Depot", "HD"),
    ("Costco Wholesale", "COST"),
    ("Costco", "COST"),
    ("Boeing", "BA"),
    ("McDonald's", "MCD"),
    ("McDonalds", "MCD"),
];
