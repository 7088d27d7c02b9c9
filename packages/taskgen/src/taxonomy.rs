//! Fixed sector/occupation taxonomy tasks are classified under.

/// An economic sector and the occupations tasks may target within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub name: &'static str,
    /// Share of GDP, as displayed.
    pub gdp_share: &'static str,
    pub occupations: &'static [&'static str],
}

impl Sector {
    pub fn has_occupation(&self, occupation: &str) -> bool {
        self.occupations.contains(&occupation)
    }
}

pub const SECTORS: &[Sector] = &[
    Sector {
        name: "Real Estate and Rental and Leasing",
        gdp_share: "13.8%",
        occupations: &[
            "Property/Real Estate/Community Association Managers",
            "Counter and Rental Clerks",
            "Real Estate Sales Agents",
            "Real Estate Brokers",
            "Concierges",
        ],
    },
    Sector {
        name: "Government",
        gdp_share: "11.3%",
        occupations: &[
            "Compliance Officers",
            "Administrative Services Managers",
            "Child, Family, and School Social Workers",
            "First-Line Supervisors of Police and Detectives",
            "Recreation Workers",
        ],
    },
    Sector {
        name: "Manufacturing",
        gdp_share: "10.0%",
        occupations: &[
            "First-Line Supervisors of Production and Operating Workers",
            "Buyers and Purchasing Agents",
            "Shipping, Receiving, and Inventory Clerks",
            "Industrial Engineers",
            "Mechanical Engineers",
        ],
    },
    Sector {
        name: "Professional, Scientific, and Technical Services",
        gdp_share: "8.1%",
        occupations: &[
            "Software Developers",
            "Lawyers",
            "Accountants and Auditors",
            "Computer and Information Systems Managers",
            "Project Management Specialists",
        ],
    },
    Sector {
        name: "Health Care and Social Assistance",
        gdp_share: "7.6%",
        occupations: &[
            "Registered Nurses",
            "First-Line Supervisors of Office/Admin Support",
            "Medical & Health Services Managers",
            "Nurse Practitioners",
            "Medical Secretaries & Admin Assistants",
        ],
    },
    Sector {
        name: "Finance and Insurance",
        gdp_share: "7.4%",
        occupations: &[
            "Financial Managers",
            "Customer Service Representatives",
            "Securities, Commodities, and Financial Services Sales Agents",
            "Personal Financial Advisors",
            "Financial and Investment Analysts",
        ],
    },
    Sector {
        name: "Retail Trade",
        gdp_share: "6.3%",
        occupations: &[
            "General & Operations Managers",
            "First-Line Supervisors of Retail Sales Workers",
            "Pharmacists",
            "Private Detectives & Investigators",
        ],
    },
    Sector {
        name: "Wholesale Trade",
        gdp_share: "5.8%",
        occupations: &[
            "Sales Representatives, Wholesale & Manufacturing (Except Tech/Scientific)",
            "Sales Managers",
            "Sales Representatives, Wholesale & Manufacturing (Tech/Scientific)",
            "First-Line Supervisors of Non-Retail Sales Workers",
            "Order Clerks",
        ],
    },
    Sector {
        name: "Information",
        gdp_share: "5.4%",
        occupations: &[
            "Producers & Directors",
            "Editors",
            "News Analysts, Reporters, and Journalists",
            "Audio & Video Technicians",
            "Film & Video Editors",
        ],
    },
];

/// Look up a sector by exact name.
pub fn find_sector(name: &str) -> Option<&'static Sector> {
    SECTORS.iter().find(|s| s.name == name)
}

/// Occupations offered once `sector` is selected; empty for unknown sectors.
pub fn occupations_for(sector: &str) -> &'static [&'static str] {
    find_sector(sector).map(|s| s.occupations).unwrap_or(&[])
}
