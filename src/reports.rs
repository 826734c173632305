//! Report catalogue: one prompt template and one response shape per
//! report kind, plus strongly typed records for the kinds callers
//! consume field by field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use log::{debug, info};

use crate::error::Error;
use crate::generation::StructuredGenerationClient;
use crate::providers::Provider;
use crate::request::{Field, GenerationRequest, ShapeDescriptor};
use crate::QualityMode;

/// Every report the assistant can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind
{   MarketAnalysis
  , CompetitorLandscape
  , Swot
  , Pestle
  , PortersFiveForces
  , BusinessModelCanvas
  , ValueProposition
  , CustomerPersonas
  , GoToMarket
  , PricingStrategy
  , FinancialProjection
  , RiskAssessment
  , OkrPlan
  , ProductRoadmap
  , BrandStrategy
  , ContentStrategy
  , InvestorPitch
  , TrendForecast
  , BlueOcean
  , Workforce
}

/// Short structured brief collected from the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief
{   /// Market or business topic, e.g. "plant-based snacks in Germany"
    pub topic: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>
  , /// Free text the user wants taken into account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>
}

impl Brief
{   pub fn new(topic: impl Into<String>) -> Self
    {   Brief
        {   topic: topic.into()
          , ..Brief::default()
        }
    }
}

/// A generated report as handed to the UI and the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report
{   pub kind: ReportKind
  , pub quality: QualityMode
  , pub body: Value
  , pub generated_at_ms: u64
}

pub(crate) fn now_millis() -> u64
{   SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis() as u64)
      .unwrap_or(0)
}

// ===== Shape helpers =====

fn s(name: &str) -> Field
{   Field::required(name, ShapeDescriptor::String)
}

fn list(name: &str) -> Field
{   Field::required(name, ShapeDescriptor::strings())
}

fn records(name: &str, fields: Vec<Field>) -> Field
{   Field::required(
      name,
      ShapeDescriptor::array_of(ShapeDescriptor::object(fields))
    )
}

fn summary() -> Field
{   s("executiveSummary")
      .describe("Three to five sentence overview for a busy executive")
}

impl ReportKind
{   pub const ALL: [ReportKind; 20] =
    [   ReportKind::MarketAnalysis
      , ReportKind::CompetitorLandscape
      , ReportKind::Swot
      , ReportKind::Pestle
      , ReportKind::PortersFiveForces
      , ReportKind::BusinessModelCanvas
      , ReportKind::ValueProposition
      , ReportKind::CustomerPersonas
      , ReportKind::GoToMarket
      , ReportKind::PricingStrategy
      , ReportKind::FinancialProjection
      , ReportKind::RiskAssessment
      , ReportKind::OkrPlan
      , ReportKind::ProductRoadmap
      , ReportKind::BrandStrategy
      , ReportKind::ContentStrategy
      , ReportKind::InvestorPitch
      , ReportKind::TrendForecast
      , ReportKind::BlueOcean
      , ReportKind::Workforce
    ];

    pub fn title(&self) -> &'static str
    {   match self
        {   ReportKind::MarketAnalysis => "Market Analysis"
          , ReportKind::CompetitorLandscape => "Competitor Landscape"
          , ReportKind::Swot => "SWOT Analysis"
          , ReportKind::Pestle => "PESTLE Analysis"
          , ReportKind::PortersFiveForces => "Porter's Five Forces"
          , ReportKind::BusinessModelCanvas => "Business Model Canvas"
          , ReportKind::ValueProposition => "Value Proposition Canvas"
          , ReportKind::CustomerPersonas => "Customer Personas"
          , ReportKind::GoToMarket => "Go-To-Market Plan"
          , ReportKind::PricingStrategy => "Pricing Strategy"
          , ReportKind::FinancialProjection => "Financial Projection"
          , ReportKind::RiskAssessment => "Risk Assessment"
          , ReportKind::OkrPlan => "OKR Plan"
          , ReportKind::ProductRoadmap => "Product Roadmap"
          , ReportKind::BrandStrategy => "Brand Strategy"
          , ReportKind::ContentStrategy => "Content Strategy"
          , ReportKind::InvestorPitch => "Investor Pitch"
          , ReportKind::TrendForecast => "Trend Forecast"
          , ReportKind::BlueOcean => "Blue Ocean Strategy"
          , ReportKind::Workforce => "AI Workforce"
        }
    }

    /// Task sentence placed at the top of the prompt
    pub fn instruction(&self) -> &'static str
    {   match self
        {   ReportKind::MarketAnalysis =>
              "Size the market (TAM, SAM, SOM), estimate growth, and \
               identify key trends, customer segments, opportunities \
               and threats."
          , ReportKind::CompetitorLandscape =>
              "Identify the main competitors, how each is positioned, \
               their strengths and weaknesses, and where there is room \
               to differentiate."
          , ReportKind::Swot =>
              "Produce a SWOT analysis and the strategic implications \
               that follow from it."
          , ReportKind::Pestle =>
              "Assess political, economic, social, technological, legal \
               and environmental factors."
          , ReportKind::PortersFiveForces =>
              "Rate the intensity of each of Porter's five forces with \
               its drivers and judge overall industry attractiveness."
          , ReportKind::BusinessModelCanvas =>
              "Fill in all nine blocks of a business model canvas."
          , ReportKind::ValueProposition =>
              "Map customer jobs, pains and gains against products, pain \
               relievers and gain creators, then write a one-sentence \
               value proposition."
          , ReportKind::CustomerPersonas =>
              "Describe three to five distinct customer personas."
          , ReportKind::GoToMarket =>
              "Plan a go-to-market: target segments, positioning, \
               channels with rationale, launch phases and success \
               metrics."
          , ReportKind::PricingStrategy =>
              "Recommend a pricing model with concrete tiers, the \
               rationale behind it and its risks."
          , ReportKind::FinancialProjection =>
              "Project revenue, costs and profit for the next three to \
               five years, listing assumptions and the break-even point."
          , ReportKind::RiskAssessment =>
              "List the main business risks with likelihood, impact and \
               mitigation."
          , ReportKind::OkrPlan =>
              "Set three to five objectives with measurable key results \
               for the next quarter."
          , ReportKind::ProductRoadmap =>
              "Lay out a quarter-by-quarter product roadmap for the next \
               year."
          , ReportKind::BrandStrategy =>
              "Define mission, vision, values, brand voice and tagline \
               options."
          , ReportKind::ContentStrategy =>
              "Define content pillars with topics, distribution channels \
               and publishing cadence."
          , ReportKind::InvestorPitch =>
              "Draft an investor pitch: problem, solution, market \
               opportunity, business model, traction, the ask and a \
               slide outline."
          , ReportKind::TrendForecast =>
              "Forecast the trends most likely to reshape this market, \
               with time horizon, impact and early signals."
          , ReportKind::BlueOcean =>
              "Apply the eliminate-reduce-raise-create grid and describe \
               the uncontested market space it opens."
          , ReportKind::Workforce =>
              "Design a team of AI agents to run this business: name, \
               role, responsibilities, skills and KPIs for each."
        }
    }

    /// Response shape sent as the provider schema
    pub fn shape(&self) -> ShapeDescriptor
    {   let fields = match self
        {   ReportKind::MarketAnalysis => vec![
              summary()
            , Field::required("marketSize", ShapeDescriptor::object(vec![
                s("tam"), s("sam"), s("som")
              ]))
            , s("growthRate")
            , list("keyTrends")
            , records("customerSegments", vec![
                s("name"), s("description"), list("painPoints")
              ])
            , list("opportunities")
            , list("threats")
            ]
          , ReportKind::CompetitorLandscape => vec![
              summary()
            , records("competitors", vec![
                s("name")
              , s("positioning")
              , list("strengths")
              , list("weaknesses")
              , Field::optional(
                  "estimatedMarketShare", ShapeDescriptor::String
                )
              ])
            , list("differentiationOpportunities")
            ]
          , ReportKind::Swot => vec![
              summary()
            , list("strengths")
            , list("weaknesses")
            , list("opportunities")
            , list("threats")
            , list("strategicImplications")
            ]
          , ReportKind::Pestle => vec![
              summary()
            , list("political")
            , list("economic")
            , list("social")
            , list("technological")
            , list("legal")
            , list("environmental")
            ]
          , ReportKind::PortersFiveForces => vec![
              summary()
            , records("forces", vec![
                s("force")
              , s("intensity").describe("low, medium or high")
              , list("drivers")
              ])
            , s("overallAttractiveness")
            ]
          , ReportKind::BusinessModelCanvas => vec![
              summary()
            , list("keyPartners")
            , list("keyActivities")
            , list("keyResources")
            , list("valuePropositions")
            , list("customerRelationships")
            , list("channels")
            , list("customerSegments")
            , list("costStructure")
            , list("revenueStreams")
            ]
          , ReportKind::ValueProposition => vec![
              summary()
            , list("customerJobs")
            , list("pains")
            , list("gains")
            , list("productsAndServices")
            , list("painRelievers")
            , list("gainCreators")
            , s("statement")
            ]
          , ReportKind::CustomerPersonas => vec![
              summary()
            , records("personas", vec![
                s("name")
              , s("role")
              , s("demographics")
              , list("goals")
              , list("frustrations")
              , list("preferredChannels")
              ])
            ]
          , ReportKind::GoToMarket => vec![
              summary()
            , list("targetSegments")
            , s("positioning")
            , records("channels", vec![s("channel"), s("rationale")])
            , records("launchPhases", vec![
                s("phase"), s("timeline"), list("activities")
              ])
            , list("successMetrics")
            ]
          , ReportKind::PricingStrategy => vec![
              summary()
            , s("pricingModel")
            , records("tiers", vec![
                s("name"), s("price"), list("features")
              ])
            , s("rationale")
            , list("risks")
            ]
          , ReportKind::FinancialProjection => vec![
              summary()
            , list("assumptions")
            , records("years", vec![
                Field::required("year", ShapeDescriptor::Integer)
              , Field::required("revenue", ShapeDescriptor::Number)
              , Field::required("costs", ShapeDescriptor::Number)
              , Field::required("profit", ShapeDescriptor::Number)
              ])
            , s("breakEven")
            ]
          , ReportKind::RiskAssessment => vec![
              summary()
            , records("risks", vec![
                s("risk"), s("likelihood"), s("impact"), s("mitigation")
              ])
            ]
          , ReportKind::OkrPlan => vec![
              summary()
            , records("objectives", vec![
                s("objective"), list("keyResults")
              ])
            ]
          , ReportKind::ProductRoadmap => vec![
              summary()
            , records("milestones", vec![
                s("quarter"), s("theme"), list("deliverables")
              ])
            ]
          , ReportKind::BrandStrategy => vec![
              summary()
            , s("mission")
            , s("vision")
            , list("values")
            , s("voice")
            , list("taglines")
            ]
          , ReportKind::ContentStrategy => vec![
              summary()
            , records("pillars", vec![s("pillar"), list("topics")])
            , list("channels")
            , s("cadence")
            ]
          , ReportKind::InvestorPitch => vec![
              summary()
            , s("problem")
            , s("solution")
            , s("marketOpportunity")
            , s("businessModel")
            , s("traction")
            , s("ask")
            , records("slides", vec![s("title"), list("talkingPoints")])
            ]
          , ReportKind::TrendForecast => vec![
              summary()
            , records("trends", vec![
                s("trend"), s("horizon"), s("impact"), list("signals")
              ])
            ]
          , ReportKind::BlueOcean => vec![
              summary()
            , list("eliminate")
            , list("reduce")
            , list("raise")
            , list("create")
            , s("newMarketSpace")
            ]
          , ReportKind::Workforce => vec![
              summary()
            , records("agents", vec![
                s("name")
              , s("role")
              , list("responsibilities")
              , list("skills")
              , list("kpis")
              ])
            ]
        };
        ShapeDescriptor::object(fields)
    }
}

/// Fill the prompt template for one report kind
pub fn build_prompt(kind: ReportKind, brief: &Brief) -> String
{   let mut prompt = format!(
      "You are a senior business strategy consultant preparing a {}.\n\
       Task: {}\n\n\
       Topic: {}\n",
      kind.title(),
      kind.instruction(),
      brief.topic.trim()
    );
    let optional = [
      ("Industry", &brief.industry)
    , ("Target audience", &brief.audience)
    , ("Goals", &brief.goals)
    , ("Additional context", &brief.context)
    ];
    for (label, value) in optional
    {   if let Some(value) = value.as_deref()
          .map(str::trim)
          .filter(|v| !v.is_empty())
        {   prompt.push_str(&format!("{}: {}\n", label, value));
        }
    }
    prompt.push_str(
      "\nBe concrete and specific to this topic. \
       Respond only with JSON matching the provided schema."
    );
    prompt
}

// ===== Typed records =====

/// Report with its own strongly typed record
pub trait TypedReport: serde::de::DeserializeOwned
{   const KIND: ReportKind;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwotAnalysis
{   pub executive_summary: String
  , pub strengths: Vec<String>
  , pub weaknesses: Vec<String>
  , pub opportunities: Vec<String>
  , pub threats: Vec<String>
  , #[serde(default)]
    pub strategic_implications: Vec<String>
}

impl TypedReport for SwotAnalysis
{   const KIND: ReportKind = ReportKind::Swot;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSize
{   pub tam: String
  , pub sam: String
  , pub som: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegment
{   pub name: String
  , pub description: String
  , #[serde(default)]
    pub pain_points: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis
{   pub executive_summary: String
  , pub market_size: MarketSize
  , pub growth_rate: String
  , #[serde(default)]
    pub key_trends: Vec<String>
  , #[serde(default)]
    pub customer_segments: Vec<CustomerSegment>
  , #[serde(default)]
    pub opportunities: Vec<String>
  , #[serde(default)]
    pub threats: Vec<String>
}

impl TypedReport for MarketAnalysis
{   const KIND: ReportKind = ReportKind::MarketAnalysis;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor
{   pub name: String
  , pub positioning: String
  , #[serde(default)]
    pub strengths: Vec<String>
  , #[serde(default)]
    pub weaknesses: Vec<String>
  , #[serde(default)]
    pub estimated_market_share: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorLandscape
{   pub executive_summary: String
  , pub competitors: Vec<Competitor>
  , #[serde(default)]
    pub differentiation_opportunities: Vec<String>
}

impl TypedReport for CompetitorLandscape
{   const KIND: ReportKind = ReportKind::CompetitorLandscape;
}

/// One member of a generated AI workforce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent
{   pub name: String
  , pub role: String
  , #[serde(default)]
    pub responsibilities: Vec<String>
  , #[serde(default)]
    pub skills: Vec<String>
  , #[serde(default)]
    pub kpis: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workforce
{   pub executive_summary: String
  , pub agents: Vec<Agent>
}

impl TypedReport for Workforce
{   const KIND: ReportKind = ReportKind::Workforce;
}

// ===== Report wrappers =====

impl<P: Provider> StructuredGenerationClient<P>
{   /// Generate any report kind, keeping the body as raw JSON
    pub async fn generate_report(
      &self
    , kind: ReportKind
    , brief: &Brief
    , quality: QualityMode
    ) -> Result<Report, Error>
    {   debug!("Generating {:?} for topic: {}", kind, brief.topic);
        let request = GenerationRequest::new(
          build_prompt(kind, brief),
          kind.shape(),
          quality
        );
        let body: Value = self.generate(request).await?;
        info!("{} generated", kind.title());
        Ok(Report
        {   kind
          , quality
          , body
          , generated_at_ms: now_millis()
        })
    }

    /// Generate a report straight into its typed record
    pub async fn generate_typed<R: TypedReport>(
      &self
    , brief: &Brief
    , quality: QualityMode
    ) -> Result<R, Error>
    {   debug!("Generating typed {:?} for topic: {}", R::KIND, brief.topic);
        let request = GenerationRequest::new(
          build_prompt(R::KIND, brief),
          R::KIND.shape(),
          quality
        );
        self.generate(request).await
    }
}
