//! Partial-payload generators, dispatched by variant.

mod abandoned;
mod adr;
mod annual;
mod approval;
mod roadworthiness;

use super::{CertificateData, CertificatePayload, PayloadSection};
use crate::workflows::certificates::catalog::TestTypeCatalog;
use crate::workflows::certificates::classification::CertificateCategory;
use crate::workflows::certificates::defects::policy::PrsPolicy;
use crate::workflows::certificates::domain::{TestOutcome, TestUnit};
use crate::workflows::certificates::reference::{LookupError, ReferenceData};

pub use self::annual::odometer_entries;

/// Inputs shared by every generator of one assembly.
pub struct AssemblyContext<'a> {
    pub unit: &'a TestUnit,
    pub category: CertificateCategory,
    pub welsh: bool,
    pub catalog: &'a TestTypeCatalog,
    pub reference: &'a ReferenceData,
    pub prs_policy: &'a dyn PrsPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{generator} generator failed: {source}")]
    Lookup {
        generator: &'static str,
        #[source]
        source: LookupError,
    },
}

impl GenerationError {
    fn lookup(generator: Generator) -> impl FnOnce(LookupError) -> Self {
        move |source| GenerationError::Lookup {
            generator: generator.name(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    TestDetails,
    Defects,
    MakeAndModel,
    OdometerHistory,
    Abandoned,
    Adr,
    Iva,
    Msva,
    Roadworthiness,
}

impl Generator {
    pub const ALL: [Generator; 9] = [
        Generator::TestDetails,
        Generator::Defects,
        Generator::MakeAndModel,
        Generator::OdometerHistory,
        Generator::Abandoned,
        Generator::Adr,
        Generator::Iva,
        Generator::Msva,
        Generator::Roadworthiness,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Generator::TestDetails => "test details",
            Generator::Defects => "defects",
            Generator::MakeAndModel => "make and model",
            Generator::OdometerHistory => "odometer history",
            Generator::Abandoned => "abandoned",
            Generator::Adr => "adr",
            Generator::Iva => "iva",
            Generator::Msva => "msva",
            Generator::Roadworthiness => "roadworthiness",
        }
    }

    pub fn applies(self, category: CertificateCategory, unit: &TestUnit) -> bool {
        match self {
            Generator::TestDetails | Generator::Defects | Generator::MakeAndModel => {
                category.is_annual()
            }
            Generator::OdometerHistory => category.is_annual() && !unit.is_trailer(),
            Generator::Abandoned => category == CertificateCategory::Abandoned,
            Generator::Adr => category == CertificateCategory::Adr,
            Generator::Iva => category == CertificateCategory::Iva,
            Generator::Msva => category == CertificateCategory::Msva,
            Generator::Roadworthiness => category == CertificateCategory::Rwt,
        }
    }

    pub async fn generate(
        self,
        context: &AssemblyContext<'_>,
    ) -> Result<CertificatePayload, GenerationError> {
        match self {
            Generator::TestDetails => Ok(annual::test_details(context)),
            Generator::Defects => Ok(annual::defects(context).await),
            Generator::MakeAndModel => annual::make_and_model(context).await,
            Generator::OdometerHistory => annual::odometer_history(context).await,
            Generator::Abandoned => Ok(abandoned::generate(context)),
            Generator::Adr => adr::generate(context).await,
            Generator::Iva => Ok(approval::iva(context)),
            Generator::Msva => Ok(approval::msva(context)),
            Generator::Roadworthiness => roadworthiness::generate(context).await,
        }
    }
}

/// Builds one annual page per applicable section, skipping pages with nothing on them.
fn per_section<F>(result: TestOutcome, mut build: F) -> CertificatePayload
where
    F: FnMut(PayloadSection) -> CertificateData,
{
    PayloadSection::for_result(result)
        .into_iter()
        .map(|section| (section, build(section)))
        .filter(|(_, data)| *data != CertificateData::default())
        .fold(CertificatePayload::default(), |payload, (section, data)| {
            payload.merge(CertificatePayload::with_section(section, data))
        })
}
