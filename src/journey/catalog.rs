//! Stage and tool lookup tables

use serde::Serialize;

/// One of the twelve stages of the patient journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JourneyStage {
    Awareness,
    Diagnosis,
    Research,
    Staging,
    Planning,
    Insurance,
    Neoadjuvant,
    Surgery,
    Maintenance,
    EarlyRecovery,
    Surveillance,
    LongTermLiving,
}

/// Display attributes of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    pub number: u8,
    pub slug: &'static str,
    pub name: &'static str,
    pub theme: &'static str,
}

static STAGE_INFO: [StageInfo; 12] = [
    StageInfo {
        number: 1,
        slug: "awareness",
        name: "First Hints & Initial Visit",
        theme: "From Fear to Understanding",
    },
    StageInfo {
        number: 2,
        slug: "diagnosis",
        name: "Specialist Work-up & Diagnosis",
        theme: "From Shock to Clarity",
    },
    StageInfo {
        number: 3,
        slug: "research",
        name: "Research & Compare-Care",
        theme: "From Confusion to Clarity",
    },
    StageInfo {
        number: 4,
        slug: "staging",
        name: "Staging & Baseline Testing",
        theme: "From Uncertainty to Planning",
    },
    StageInfo {
        number: 5,
        slug: "planning",
        name: "Treatment Planning",
        theme: "From Options to Decision",
    },
    StageInfo {
        number: 6,
        slug: "insurance",
        name: "Insurance & Travel Setup",
        theme: "From Bureaucracy to Preparation",
    },
    StageInfo {
        number: 7,
        slug: "neoadjuvant",
        name: "Neoadjuvant Therapy",
        theme: "From Endurance to Empowerment",
    },
    StageInfo {
        number: 8,
        slug: "surgery",
        name: "Surgery & Local Treatment",
        theme: "From Fear to Recovery",
    },
    StageInfo {
        number: 9,
        slug: "maintenance",
        name: "Maintenance Therapy",
        theme: "From Survival to Thriving",
    },
    StageInfo {
        number: 10,
        slug: "early-recovery",
        name: "Early Recovery",
        theme: "From Treatment to Healing",
    },
    StageInfo {
        number: 11,
        slug: "surveillance",
        name: "Surveillance & Rehabilitation",
        theme: "From Monitoring to Living",
    },
    StageInfo {
        number: 12,
        slug: "long-term-living",
        name: "Long-term Living",
        theme: "From Management to Mastery",
    },
];

impl JourneyStage {
    pub const ALL: [Self; 12] = [
        Self::Awareness,
        Self::Diagnosis,
        Self::Research,
        Self::Staging,
        Self::Planning,
        Self::Insurance,
        Self::Neoadjuvant,
        Self::Surgery,
        Self::Maintenance,
        Self::EarlyRecovery,
        Self::Surveillance,
        Self::LongTermLiving,
    ];

    #[must_use]
    pub fn info(self) -> &'static StageInfo {
        &STAGE_INFO[self as usize]
    }

    #[must_use]
    pub fn number(self) -> u8 {
        self.info().number
    }

    /// Stage by its 1-based number
    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == number)
    }

    /// Stage by the slug used in the patient context (`journeyStage`)
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.info().slug.eq_ignore_ascii_case(slug.trim()))
    }

    /// Tools offered at this stage, in panel order
    pub fn tools(self) -> impl Iterator<Item = &'static Tool> {
        TOOLS.iter().filter(move |t| t.stage == self)
    }
}

/// Tool grouping shown in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    Tracking,
    Planning,
    Ai,
    Translation,
    Preparation,
    Community,
    Comparison,
    Financial,
    Logistics,
    Education,
    Scheduling,
    Organization,
    Visualization,
    Research,
    Advocacy,
    Monitoring,
    Wellness,
    Motivation,
    Rehabilitation,
    MentalHealth,
    Documentation,
}

impl ToolCategory {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tracking => "tracking",
            Self::Planning => "planning",
            Self::Ai => "ai",
            Self::Translation => "translation",
            Self::Preparation => "preparation",
            Self::Community => "community",
            Self::Comparison => "comparison",
            Self::Financial => "financial",
            Self::Logistics => "logistics",
            Self::Education => "education",
            Self::Scheduling => "scheduling",
            Self::Organization => "organization",
            Self::Visualization => "visualization",
            Self::Research => "research",
            Self::Advocacy => "advocacy",
            Self::Monitoring => "monitoring",
            Self::Wellness => "wellness",
            Self::Motivation => "motivation",
            Self::Rehabilitation => "rehabilitation",
            Self::MentalHealth => "mental-health",
            Self::Documentation => "documentation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// A journey tool Dr. Maya can demonstrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: ToolCategory,
    pub stage: JourneyStage,
    pub priority: Priority,
}

impl Tool {
    /// Message asking Dr. Maya to walk the user through this tool
    #[must_use]
    pub fn demonstration_message(&self) -> String {
        format!(
            "Dr. Maya, the user has selected the \"{}\" tool from Stage {}. This tool is designed \
             to {}. Please acknowledge their selection and begin demonstrating this tool by \
             walking them through its capabilities step-by-step. Show them how this tool works \
             autonomously and guide them through a complete demonstration of its features.",
            self.name,
            self.stage.number(),
            self.description.to_lowercase(),
        )
    }
}

/// Tools sent as `availableTools` when nothing else is configured
pub const DEFAULT_AVAILABLE_TOOLS: [&str; 6] = [
    "symptom-tracker",
    "appointment-prep",
    "treatment-calendar",
    "medical-translator",
    "question-generator",
    "compare-care",
];

/// Look up a tool by id
#[must_use]
pub fn find_tool(id: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|t| t.id == id)
}

macro_rules! tool {
    ($id:literal, $name:literal, $desc:literal, $icon:literal, $cat:ident, $stage:ident, $prio:ident) => {
        Tool {
            id: $id,
            name: $name,
            description: $desc,
            icon: $icon,
            category: ToolCategory::$cat,
            stage: JourneyStage::$stage,
            priority: Priority::$prio,
        }
    };
}

/// Every tool, grouped by stage in panel order
#[rustfmt::skip]
pub static TOOLS: [Tool; 36] = [
    tool!("symptom-tracker", "Symptom Tracker", "Document progression and patterns", "📊", Tracking, Awareness, High),
    tool!("appointment-prep", "Appointment Prep", "Optimize initial doctor visits", "📋", Planning, Awareness, High),
    tool!("ai-symptom-sage", "AI Symptom Sage", "Real-time symptom interpretation", "🧠", Ai, Awareness, High),
    tool!("medical-translator", "Medical Translator", "Convert complex reports to plain language", "🔤", Translation, Diagnosis, High),
    tool!("question-generator", "Question Generator", "AI-generated consultation checklists", "❓", Preparation, Diagnosis, High),
    tool!("peer-connection", "Peer Connection", "Connect with similar diagnosis", "👥", Community, Diagnosis, Medium),
    tool!("compare-care", "Compare-My-Care™", "Rank hospitals by outcomes & culture", "⚖️", Comparison, Research, High),
    tool!("insurance-analyzer", "Insurance Analyzer", "Coverage and network navigation", "🛡️", Financial, Research, High),
    tool!("travel-planner", "Travel Planner", "Accommodation and logistics", "✈️", Logistics, Research, Medium),
    tool!("staging-translator", "Staging Translator", "Plain-language staging explanations", "📖", Education, Staging, High),
    tool!("test-coordinator", "Test Coordinator", "Cross-department scheduling", "🗓️", Scheduling, Staging, High),
    tool!("results-repository", "Results Repository", "Organized storage of test results", "📁", Organization, Staging, Medium),
    tool!("tumor-board", "Virtual Tumor Board", "Patient representation in planning", "🎯", Planning, Planning, High),
    tool!("treatment-visualizer", "Treatment Visualizer", "Compare approaches with visual aids", "📊", Visualization, Planning, High),
    tool!("trial-matcher", "Trial Matcher", "Clinical trial eligibility screening", "🔬", Research, Planning, Medium),
    tool!("appeals-assistant", "Appeals Assistant", "Automated insurance appeals", "⚔️", Advocacy, Insurance, High),
    tool!("cost-calculator", "Cost Calculator", "Transparent pricing & planning", "💰", Financial, Insurance, High),
    tool!("accommodation-concierge", "Accommodation Concierge", "Curated options near centers", "🏨", Logistics, Insurance, Medium),
    tool!("side-effect-tracker", "Side Effect Tracker", "AI-powered monitoring with alerts", "⚠️", Monitoring, Neoadjuvant, High),
    tool!("treatment-calendar", "Treatment Calendar", "Integrated scheduling with reminders", "📅", Scheduling, Neoadjuvant, High),
    tool!("nutrition-support", "Nutrition Support", "Personalized dietary guidance", "🥗", Wellness, Neoadjuvant, Medium),
    tool!("surgical-prep", "Surgical Prep Suite", "Complete preparation checklist", "🏥", Preparation, Surgery, High),
    tool!("virtual-tour", "Virtual Hospital Tour", "Immersive procedure explanation", "🏛️", Education, Surgery, Medium),
    tool!("recovery-tracker", "Recovery Tracker", "Progress monitoring with expectations", "📈", Monitoring, Surgery, High),
    tool!("recovery-planner", "Recovery Planner", "Balance treatment and recovery", "📋", Planning, Maintenance, High),
    tool!("complementary-guide", "Complementary Guide", "Evidence-based alternative approaches", "🌿", Wellness, Maintenance, Medium),
    tool!("completion-countdown", "Completion Countdown", "Milestone celebration system", "🎉", Motivation, Maintenance, Medium),
    tool!("milestone-tracker", "Milestone Tracker", "Realistic expectation management", "🎯", Tracking, EarlyRecovery, High),
    tool!("rehab-program", "Rehab Program", "Physical therapy optimization", "💪", Rehabilitation, EarlyRecovery, High),
    tool!("scan-anxiety", "Scan Anxiety Tools", "Preparation and coping strategies", "🧘", MentalHealth, EarlyRecovery, Medium),
    tool!("surveillance-manager", "Surveillance Manager", "Automated reminders & coordination", "👁️", Scheduling, Surveillance, High),
    tool!("survivorship-planner", "Survivorship Planner", "Comprehensive long-term planning", "🗺️", Planning, Surveillance, High),
    tool!("lifestyle-optimizer", "Lifestyle Optimizer", "Survivor-specific health recommendations", "⚡", Wellness, Surveillance, Medium),
    tool!("survivorship-care", "Survivorship Care", "Lifelong health management", "🌟", Planning, LongTermLiving, High),
    tool!("mentorship-program", "Mentorship Program", "Connect with newly diagnosed", "🤝", Community, LongTermLiving, Medium),
    tool!("legacy-docs", "Legacy Documentation", "Comprehensive medical history", "📜", Documentation, LongTermLiving, Medium),
];
