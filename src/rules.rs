use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub label: &'static str,
    pub phrases: &'static [&'static str],
}

pub const CAT_URGENT: Category = Category {
    id: "SG001",
    name: "urgentLanguage",
    label: "Urgent Language",
    phrases: &[
        "urgent", "immediately", "act now", "within 24 hours", "limited time",
        "expires today", "last chance", "final notice", "action required",
    ],
};

pub const CAT_PAYMENT: Category = Category {
    id: "SG002",
    name: "paymentRequests",
    label: "Payment Requests",
    phrases: &[
        "wire transfer", "gift card", "bitcoin", "cryptocurrency", "western union",
        "money gram", "send money", "payment needed", "confirm payment", "itunes card",
        "google play card", "steam card", "prepaid card", "cash app", "venmo", "zelle",
    ],
};

pub const CAT_IDENTITY: Category = Category {
    id: "SG003",
    name: "identityTheft",
    label: "Identity Theft",
    phrases: &[
        "verify your account", "confirm your identity", "social security number",
        "ssn", "account suspended", "unusual activity", "verify credentials",
        "update payment information", "confirm password", "security alert",
    ],
};

pub const CAT_PRIZES: Category = Category {
    id: "SG004",
    name: "prizes",
    label: "Prizes",
    phrases: &[
        "you've won", "winner", "claim your prize", "lottery", "jackpot",
        "free gift", "congratulations", "selected winner", "prize claim",
    ],
};

pub const CAT_TECH_SUPPORT: Category = Category {
    id: "SG005",
    name: "techSupport",
    label: "Tech Support",
    phrases: &[
        "your computer has a virus", "windows security", "apple support",
        "microsoft support", "remote access", "tech support", "security breach",
        "infected", "malware detected", "expired license",
    ],
};

pub const CAT_AUTHORITY: Category = Category {
    id: "SG006",
    name: "authorityImpersonation",
    label: "Authority Impersonation",
    phrases: &[
        "irs", "internal revenue service", "social security administration",
        "fbi", "police department", "court", "legal action", "arrest warrant",
        "tax refund", "government agency",
    ],
};

pub fn all_categories() -> &'static [Category] {
    &[
        CAT_URGENT,
        CAT_PAYMENT,
        CAT_IDENTITY,
        CAT_PRIZES,
        CAT_TECH_SUPPORT,
        CAT_AUTHORITY,
    ]
}

/// Extra category (or extra phrases for a built-in one) supplied by configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCategory {
    pub id: String,
    pub name: String,
    pub label: String,
    pub phrases: Vec<String>,
}

/// Ordered category -> phrase table. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCatalog {
    categories: Vec<PatternCategory>,
}

impl PatternCatalog {
    pub fn builtin() -> Self {
        Self::with_extensions(&[])
    }

    pub fn with_extensions(extra: &[CategoryConfig]) -> Self {
        let mut categories: Vec<PatternCategory> = all_categories()
            .iter()
            .map(|c| PatternCategory {
                id: c.id.to_string(),
                name: c.name.to_string(),
                label: c.label.to_string(),
                phrases: c.phrases.iter().map(|p| p.to_string()).collect(),
            })
            .collect();

        for ext in extra {
            let idx = match categories.iter().position(|c| c.name == ext.name) {
                Some(idx) => idx,
                None => {
                    categories.push(PatternCategory {
                        id: format!("SG{:03}", categories.len() + 1),
                        name: ext.name.clone(),
                        label: ext.label.clone().unwrap_or_else(|| split_camel(&ext.name)),
                        phrases: Vec::new(),
                    });
                    categories.len() - 1
                }
            };
            let cat = &mut categories[idx];
            for phrase in &ext.phrases {
                let phrase = phrase.trim().to_lowercase();
                if !phrase.is_empty() && !cat.phrases.contains(&phrase) {
                    cat.phrases.push(phrase);
                }
            }
        }

        Self { categories }
    }

    pub fn get(&self, name: &str) -> Option<&PatternCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categories(&self) -> &[PatternCategory] {
        &self.categories
    }

    pub fn phrase_count(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }
}

/// "urgentLanguage" -> "Urgent Language"
pub fn split_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}

// Link heuristics

pub const LOW_TRUST_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top"];

pub const URL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl.com", "goo.gl", "ow.ly", "t.co"];

pub const PROTECTED_BRANDS: &[&str] = &[
    "paypal", "amazon", "microsoft", "google", "apple", "facebook", "bank",
];

/// Hostnames with more labels than this are treated as subdomain stuffing.
pub const MAX_HOST_LABELS: usize = 4;

/// Homoglyph spellings of brands checked against the page URL on navigation.
pub const LOOKALIKE_BRANDS: &[(&str, &str)] = &[
    ("paypal", r"p[a4]yp[a4]l"),
    ("amazon", r"[a4]m[a4]z[o0]n"),
    ("microsoft", r"micr[o0]s[o0]ft"),
    ("google", r"g[o0][o0]gle"),
    ("apple", r"[a4]pple"),
];

pub const EMAIL_SERVICES: &[&str] = &[
    "mail.google.com",
    "mail.yahoo.com",
    "outlook.live.com",
    "outlook.office.com",
];

// Voice call phrases

pub const VOICE_CATEGORIES: &[(&str, &[&str])] = &[
    ("tech_support", &[
        "your computer has a virus", "windows has been compromised",
        "we detected suspicious activity", "your ip address", "remote access",
        "teamviewer", "anydesk", "allow me to access", "press windows key",
        "event viewer", "error messages", "your license has expired",
        "microsoft support", "apple support calling", "security alert",
    ]),
    ("irs_scam", &[
        "irs calling", "internal revenue service", "tax refund", "you owe money",
        "arrest warrant", "legal action", "send payment immediately", "tax fraud",
        "social security suspension",
    ]),
    ("bank_scam", &[
        "your account has been frozen", "suspicious transaction", "verify your identity",
        "credit card fraud", "unusual activity", "confirm your account",
        "security department", "fraud prevention",
    ]),
    ("grandparent_scam", &[
        "it's me grandma", "it's me grandpa", "i'm in trouble", "i need money",
        "don't tell mom", "don't tell dad", "i've been arrested", "i'm in jail",
        "car accident", "need bail money",
    ]),
    ("lottery_scam", &[
        "you've won", "lottery winner", "prize money", "claim your prize",
        "processing fee", "taxes on winnings", "send money to claim", "western union",
        "money gram", "gift cards",
    ]),
    ("pressure_tactics", &[
        "act now", "immediately", "urgent", "within 24 hours", "right now",
        "don't hang up", "stay on the line", "don't tell anyone",
        "keep this confidential", "limited time", "last chance",
    ]),
    ("payment_requests", &[
        "gift card", "itunes card", "google play card", "amazon card", "steam card",
        "wire transfer", "western union", "bitcoin", "cryptocurrency", "prepaid card",
        "money order", "cash app", "venmo", "zelle",
    ]),
];

/// Words that hint the caller is fishing for identity details.
pub const VOICE_IDENTITY_WORDS: &[&str] = &["verify", "confirm", "account number", "social security"];
