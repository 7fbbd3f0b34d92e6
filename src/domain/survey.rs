//! Survey answer types for heart disease risk assessment.
//!
//! Based on the CDC BRFSS 2022 survey questions the model was fitted on.
//! Every answer is a closed categorical domain; the wire strings are exactly
//! the category labels seen by the encoder during fitting.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised while building a [`SurveyAnswers`] from untyped input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("`{value}` is not a valid answer for `{field}`")]
    OutOfDomain { field: String, value: String },

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("malformed survey input: {0}")]
    Malformed(String),
}

/// A category string that is not part of the requested domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Wire values of the domain, in form order.
            pub const OPTIONS: &'static [&'static str] = &[$($wire),+];

            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Self::$variant), )+
                    other => Err(UnknownCategory(other.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical! {
    Gender {
        Female => "female",
        #[default]
        Male => "male",
        Nonbinary => "nonbinary",
    }
}

categorical! {
    Race {
        #[default]
        WhiteOnlyNonHispanic => "white_only_non_hispanic",
        BlackOnlyNonHispanic => "black_only_non_hispanic",
        AsianOnlyNonHispanic => "asian_only_non_hispanic",
        AmericanIndianOrAlaskanNative => "american_indian_or_alaskan_native_only_non_hispanic",
        MultiracialNonHispanic => "multiracial_non_hispanic",
        Hispanic => "hispanic",
        NativeHawaiianOrPacificIslander => "native_hawaiian_or_other_pacific_islander_only_non_hispanic",
    }
}

categorical! {
    GeneralHealth {
        #[default]
        Excellent => "excellent",
        VeryGood => "very_good",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

categorical! {
    HealthCareProvider {
        #[default]
        YesOnlyOne => "yes_only_one",
        MoreThanOne => "more_than_one",
        No => "no",
    }
}

categorical! {
    /// Plain yes/no answer. Defaults to `no`.
    YesNo {
        Yes => "yes",
        #[default]
        No => "no",
    }
}

categorical! {
    CheckupRecency {
        #[default]
        PastYear => "past_year",
        PastTwoYears => "past_2_years",
        PastFiveYears => "past_5_years",
        FivePlusYearsAgo => "5+_years_ago",
        Never => "never",
    }
}

categorical! {
    DiabetesStatus {
        Yes => "yes",
        #[default]
        No => "no",
        NoPrediabetes => "no_prediabetes",
        YesDuringPregnancy => "yes_during_pregnancy",
    }
}

categorical! {
    BmiCategory {
        Underweight => "underweight_bmi_less_than_18_5",
        #[default]
        NormalWeight => "normal_weight_bmi_18_5_to_24_9",
        Overweight => "overweight_bmi_25_to_29_9",
        Obese => "obese_bmi_30_or_more",
    }
}

categorical! {
    /// Days of poor physical or mental health in the past 30 days.
    DaysNotGood {
        #[default]
        Zero => "zero_days_not_good",
        OneToThirteen => "1_to_13_days_not_good",
        FourteenPlus => "14_plus_days_not_good",
    }
}

categorical! {
    AsthmaStatus {
        #[default]
        Never => "never_asthma",
        Current => "current_asthma",
        Former => "former_asthma",
    }
}

categorical! {
    SmokingStatus {
        #[default]
        NeverSmoked => "never_smoked",
        FormerSmoker => "former_smoker",
        CurrentSomeDays => "current_smoker_some_days",
        CurrentEveryDay => "current_smoker_every_day",
    }
}

categorical! {
    /// Exercise in the past 30 days. Unlike [`YesNo`], defaults to `yes`.
    ExerciseStatus {
        #[default]
        Yes => "yes",
        No => "no",
    }
}

categorical! {
    AgeCategory {
        Age18To24 => "Age_18_to_24",
        Age25To29 => "Age_25_to_29",
        Age30To34 => "Age_30_to_34",
        Age35To39 => "Age_35_to_39",
        #[default]
        Age40To44 => "Age_40_to_44",
        Age45To49 => "Age_45_to_49",
        Age50To54 => "Age_50_to_54",
        Age55To59 => "Age_55_to_59",
        Age60To64 => "Age_60_to_64",
        Age65To69 => "Age_65_to_69",
        Age70To74 => "Age_70_to_74",
        Age75To79 => "Age_75_to_79",
        Age80OrOlder => "Age_80_or_older",
    }
}

categorical! {
    SleepCategory {
        VeryShort => "very_short_sleep_0_to_3_hours",
        Short => "short_sleep_4_to_5_hours",
        #[default]
        Normal => "normal_sleep_6_to_8_hours",
        Long => "long_sleep_9_to_10_hours",
        VeryLong => "very_long_sleep_11_or_more_hours",
    }
}

categorical! {
    /// Weekly alcohol consumption.
    DrinksCategory {
        #[default]
        DidNotDrink => "did_not_drink",
        VeryLow => "very_low_consumption_0.01_to_1_drinks",
        Low => "low_consumption_1.01_to_5_drinks",
        Moderate => "moderate_consumption_5.01_to_10_drinks",
        High => "high_consumption_10.01_to_20_drinks",
        VeryHigh => "very_high_consumption_more_than_20_drinks",
    }
}

/// Form section a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSection {
    Demographics,
    MedicalHistory,
    Lifestyle,
}

impl FormSection {
    pub const ALL: [FormSection; 3] = [Self::Demographics, Self::MedicalHistory, Self::Lifestyle];

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Demographics => "Demographics",
            Self::MedicalHistory => "Medical History",
            Self::Lifestyle => "Lifestyle Factors",
        }
    }
}

/// One question of the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurveyField {
    Gender,
    Race,
    GeneralHealth,
    HealthCareProvider,
    CouldNotAffordDoctor,
    LastCheckup,
    HeartAttack,
    Stroke,
    DepressiveDisorder,
    KidneyDisease,
    Diabetes,
    Bmi,
    DifficultyWalking,
    PhysicalHealth,
    MentalHealth,
    Asthma,
    Smoking,
    BingeDrinking,
    Exercise,
    AgeCategory,
    Sleep,
    Drinks,
}

impl SurveyField {
    /// All fields in encoder column order.
    pub const ALL: [SurveyField; 22] = [
        Self::Gender,
        Self::Race,
        Self::GeneralHealth,
        Self::HealthCareProvider,
        Self::CouldNotAffordDoctor,
        Self::LastCheckup,
        Self::HeartAttack,
        Self::Stroke,
        Self::DepressiveDisorder,
        Self::KidneyDisease,
        Self::Diabetes,
        Self::Bmi,
        Self::DifficultyWalking,
        Self::PhysicalHealth,
        Self::MentalHealth,
        Self::Asthma,
        Self::Smoking,
        Self::BingeDrinking,
        Self::Exercise,
        Self::AgeCategory,
        Self::Sleep,
        Self::Drinks,
    ];

    /// All fields in the order the form presents them.
    pub const FORM_ORDER: [SurveyField; 22] = [
        Self::Gender,
        Self::Race,
        Self::AgeCategory,
        Self::GeneralHealth,
        Self::HeartAttack,
        Self::KidneyDisease,
        Self::Asthma,
        Self::CouldNotAffordDoctor,
        Self::HealthCareProvider,
        Self::Stroke,
        Self::Diabetes,
        Self::Bmi,
        Self::LastCheckup,
        Self::DepressiveDisorder,
        Self::PhysicalHealth,
        Self::MentalHealth,
        Self::DifficultyWalking,
        Self::Smoking,
        Self::Sleep,
        Self::Drinks,
        Self::BingeDrinking,
        Self::Exercise,
    ];

    /// Column name the encoder and classifier were fitted with.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Race => "race",
            Self::GeneralHealth => "general_health",
            Self::HealthCareProvider => "health_care_provider",
            Self::CouldNotAffordDoctor => "could_not_afford_to_see_doctor",
            Self::LastCheckup => "length_of_time_since_last_routine_checkup",
            Self::HeartAttack => "ever_diagnosed_with_heart_attack",
            Self::Stroke => "ever_diagnosed_with_a_stroke",
            Self::DepressiveDisorder => "ever_told_you_had_a_depressive_disorder",
            Self::KidneyDisease => "ever_told_you_have_kidney_disease",
            Self::Diabetes => "ever_told_you_had_diabetes",
            Self::Bmi => "BMI",
            Self::DifficultyWalking => "difficulty_walking_or_climbing_stairs",
            Self::PhysicalHealth => "physical_health_status",
            Self::MentalHealth => "mental_health_status",
            Self::Asthma => "asthma_Status",
            Self::Smoking => "smoking_status",
            Self::BingeDrinking => "binge_drinking_status",
            Self::Exercise => "exercise_status_in_past_30_Days",
            Self::AgeCategory => "age_category",
            Self::Sleep => "sleep_category",
            Self::Drinks => "drinks_category",
        }
    }

    /// Look up a field by its column name.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Human readable question label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Race => "Race/Ethnicity",
            Self::GeneralHealth => "Overall Health Rating",
            Self::HealthCareProvider => "Primary Healthcare Provider",
            Self::CouldNotAffordDoctor => "Unable to See Doctor Due to Cost",
            Self::LastCheckup => "Last Routine Checkup",
            Self::HeartAttack => "History of Heart Attack",
            Self::Stroke => "History of Stroke",
            Self::DepressiveDisorder => "Depressive Disorder Diagnosis",
            Self::KidneyDisease => "Kidney Disease Diagnosis",
            Self::Diabetes => "Diabetes Diagnosis",
            Self::Bmi => "Body Mass Index (BMI)",
            Self::DifficultyWalking => "Difficulty Walking/Climbing Stairs",
            Self::PhysicalHealth => "Physical Health (Past 30 Days)",
            Self::MentalHealth => "Mental Health (Past 30 Days)",
            Self::Asthma => "Asthma Status",
            Self::Smoking => "Smoking Status",
            Self::BingeDrinking => "Binge Drinking (Past 30 Days)",
            Self::Exercise => "Exercise (Past 30 Days)",
            Self::AgeCategory => "Age Group",
            Self::Sleep => "Sleep Duration (Typical Night)",
            Self::Drinks => "Weekly Alcohol Consumption",
        }
    }

    #[must_use]
    pub fn section(&self) -> FormSection {
        match self {
            Self::Gender | Self::Race | Self::AgeCategory => FormSection::Demographics,
            Self::Smoking | Self::Sleep | Self::Drinks | Self::BingeDrinking | Self::Exercise => {
                FormSection::Lifestyle
            }
            _ => FormSection::MedicalHistory,
        }
    }

    /// Optional help text shown under the question.
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::HeartAttack => {
                Some("Heart attack occurs when blood flow to the heart is blocked")
            }
            Self::Stroke => {
                Some("Stroke occurs when blood supply to the brain is interrupted")
            }
            Self::DepressiveDisorder => {
                Some("Medical condition with persistent sadness and loss of interest")
            }
            Self::Bmi => Some(
                "Calculate your BMI at https://www.nhlbi.nih.gov/health/educational/lose_wt/BMI/bmicalc.htm",
            ),
            Self::BingeDrinking => {
                Some("5+ drinks for men, 4+ drinks for women in ~2 hours")
            }
            _ => None,
        }
    }

    /// Allowed answers, in form order.
    #[must_use]
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Gender => Gender::OPTIONS,
            Self::Race => Race::OPTIONS,
            Self::GeneralHealth => GeneralHealth::OPTIONS,
            Self::HealthCareProvider => HealthCareProvider::OPTIONS,
            Self::CouldNotAffordDoctor
            | Self::HeartAttack
            | Self::Stroke
            | Self::DepressiveDisorder
            | Self::KidneyDisease
            | Self::DifficultyWalking
            | Self::BingeDrinking => YesNo::OPTIONS,
            Self::LastCheckup => CheckupRecency::OPTIONS,
            Self::Diabetes => DiabetesStatus::OPTIONS,
            Self::Bmi => BmiCategory::OPTIONS,
            Self::PhysicalHealth | Self::MentalHealth => DaysNotGood::OPTIONS,
            Self::Asthma => AsthmaStatus::OPTIONS,
            Self::Smoking => SmokingStatus::OPTIONS,
            Self::Exercise => ExerciseStatus::OPTIONS,
            Self::AgeCategory => AgeCategory::OPTIONS,
            Self::Sleep => SleepCategory::OPTIONS,
            Self::Drinks => DrinksCategory::OPTIONS,
        }
    }
}

impl std::fmt::Display for SurveyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One respondent's answers.
///
/// Field names on the wire are the encoder's column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyAnswers {
    pub gender: Gender,
    pub race: Race,
    pub general_health: GeneralHealth,
    pub health_care_provider: HealthCareProvider,
    pub could_not_afford_to_see_doctor: YesNo,
    pub length_of_time_since_last_routine_checkup: CheckupRecency,
    pub ever_diagnosed_with_heart_attack: YesNo,
    pub ever_diagnosed_with_a_stroke: YesNo,
    pub ever_told_you_had_a_depressive_disorder: YesNo,
    pub ever_told_you_have_kidney_disease: YesNo,
    pub ever_told_you_had_diabetes: DiabetesStatus,
    #[serde(rename = "BMI")]
    pub bmi: BmiCategory,
    pub difficulty_walking_or_climbing_stairs: YesNo,
    pub physical_health_status: DaysNotGood,
    pub mental_health_status: DaysNotGood,
    #[serde(rename = "asthma_Status")]
    pub asthma_status: AsthmaStatus,
    pub smoking_status: SmokingStatus,
    pub binge_drinking_status: YesNo,
    #[serde(rename = "exercise_status_in_past_30_Days")]
    pub exercise_status_in_past_30_days: ExerciseStatus,
    pub age_category: AgeCategory,
    pub sleep_category: SleepCategory,
    pub drinks_category: DrinksCategory,
}

fn parse_answer<T: FromStr<Err = UnknownCategory>>(
    field: SurveyField,
    value: &str,
) -> Result<T, ValidationError> {
    value.parse().map_err(|UnknownCategory(value)| ValidationError::OutOfDomain {
        field: field.key().to_string(),
        value,
    })
}

impl SurveyAnswers {
    /// Wire value of a single answer.
    #[must_use]
    pub fn get(&self, field: SurveyField) -> &'static str {
        match field {
            SurveyField::Gender => self.gender.as_str(),
            SurveyField::Race => self.race.as_str(),
            SurveyField::GeneralHealth => self.general_health.as_str(),
            SurveyField::HealthCareProvider => self.health_care_provider.as_str(),
            SurveyField::CouldNotAffordDoctor => self.could_not_afford_to_see_doctor.as_str(),
            SurveyField::LastCheckup => self.length_of_time_since_last_routine_checkup.as_str(),
            SurveyField::HeartAttack => self.ever_diagnosed_with_heart_attack.as_str(),
            SurveyField::Stroke => self.ever_diagnosed_with_a_stroke.as_str(),
            SurveyField::DepressiveDisorder => {
                self.ever_told_you_had_a_depressive_disorder.as_str()
            }
            SurveyField::KidneyDisease => self.ever_told_you_have_kidney_disease.as_str(),
            SurveyField::Diabetes => self.ever_told_you_had_diabetes.as_str(),
            SurveyField::Bmi => self.bmi.as_str(),
            SurveyField::DifficultyWalking => self.difficulty_walking_or_climbing_stairs.as_str(),
            SurveyField::PhysicalHealth => self.physical_health_status.as_str(),
            SurveyField::MentalHealth => self.mental_health_status.as_str(),
            SurveyField::Asthma => self.asthma_status.as_str(),
            SurveyField::Smoking => self.smoking_status.as_str(),
            SurveyField::BingeDrinking => self.binge_drinking_status.as_str(),
            SurveyField::Exercise => self.exercise_status_in_past_30_days.as_str(),
            SurveyField::AgeCategory => self.age_category.as_str(),
            SurveyField::Sleep => self.sleep_category.as_str(),
            SurveyField::Drinks => self.drinks_category.as_str(),
        }
    }

    /// Wire value for a column name, `None` if the column is not a survey question.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<&'static str> {
        SurveyField::from_key(key).map(|field| self.get(field))
    }

    /// Set a single answer from its wire value.
    ///
    /// # Errors
    /// Returns `ValidationError::OutOfDomain` if `value` is not one of the
    /// field's options. The record is left unchanged in that case.
    pub fn set(&mut self, field: SurveyField, value: &str) -> Result<(), ValidationError> {
        match field {
            SurveyField::Gender => self.gender = parse_answer(field, value)?,
            SurveyField::Race => self.race = parse_answer(field, value)?,
            SurveyField::GeneralHealth => self.general_health = parse_answer(field, value)?,
            SurveyField::HealthCareProvider => {
                self.health_care_provider = parse_answer(field, value)?
            }
            SurveyField::CouldNotAffordDoctor => {
                self.could_not_afford_to_see_doctor = parse_answer(field, value)?
            }
            SurveyField::LastCheckup => {
                self.length_of_time_since_last_routine_checkup = parse_answer(field, value)?
            }
            SurveyField::HeartAttack => {
                self.ever_diagnosed_with_heart_attack = parse_answer(field, value)?
            }
            SurveyField::Stroke => self.ever_diagnosed_with_a_stroke = parse_answer(field, value)?,
            SurveyField::DepressiveDisorder => {
                self.ever_told_you_had_a_depressive_disorder = parse_answer(field, value)?
            }
            SurveyField::KidneyDisease => {
                self.ever_told_you_have_kidney_disease = parse_answer(field, value)?
            }
            SurveyField::Diabetes => self.ever_told_you_had_diabetes = parse_answer(field, value)?,
            SurveyField::Bmi => self.bmi = parse_answer(field, value)?,
            SurveyField::DifficultyWalking => {
                self.difficulty_walking_or_climbing_stairs = parse_answer(field, value)?
            }
            SurveyField::PhysicalHealth => self.physical_health_status = parse_answer(field, value)?,
            SurveyField::MentalHealth => self.mental_health_status = parse_answer(field, value)?,
            SurveyField::Asthma => self.asthma_status = parse_answer(field, value)?,
            SurveyField::Smoking => self.smoking_status = parse_answer(field, value)?,
            SurveyField::BingeDrinking => self.binge_drinking_status = parse_answer(field, value)?,
            SurveyField::Exercise => {
                self.exercise_status_in_past_30_days = parse_answer(field, value)?
            }
            SurveyField::AgeCategory => self.age_category = parse_answer(field, value)?,
            SurveyField::Sleep => self.sleep_category = parse_answer(field, value)?,
            SurveyField::Drinks => self.drinks_category = parse_answer(field, value)?,
        }
        Ok(())
    }

    /// Move a field to the neighbouring option, wrapping around.
    pub fn cycle(&mut self, field: SurveyField, step: isize) {
        let options = field.options();
        let current = options
            .iter()
            .position(|o| *o == self.get(field))
            .unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (current + step).rem_euclid(len) as usize;
        // Options come from the field's own domain, so this cannot fail.
        let _ = self.set(field, options[next]);
    }

    /// Build answers from a column-name → value map, validating every field.
    ///
    /// All 22 fields are required. Unknown keys are rejected.
    ///
    /// # Errors
    /// Returns the first validation failure in column order.
    pub fn from_map(fields: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        if let Some(unknown) = fields.keys().find(|k| SurveyField::from_key(k).is_none()) {
            return Err(ValidationError::UnknownField(unknown.clone()));
        }

        let mut answers = Self::default();
        for field in SurveyField::ALL {
            let value = fields
                .get(field.key())
                .ok_or_else(|| ValidationError::MissingField(field.key().to_string()))?;
            answers.set(field, value)?;
        }
        Ok(answers)
    }

    /// Parse a JSON object of the 22 answers.
    ///
    /// # Errors
    /// Returns `ValidationError::Malformed` if the input is not a JSON object of
    /// strings, otherwise the first field-level failure.
    pub fn from_json(input: &str) -> Result<Self, ValidationError> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(input).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            match value {
                serde_json::Value::String(s) => {
                    fields.insert(key, s);
                }
                other => {
                    return Err(ValidationError::OutOfDomain {
                        field: key,
                        value: other.to_string(),
                    })
                }
            }
        }
        Self::from_map(&fields)
    }

    /// Column-name → value pairs in encoder column order.
    pub fn iter(&self) -> impl Iterator<Item = (SurveyField, &'static str)> + '_ {
        SurveyField::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}
