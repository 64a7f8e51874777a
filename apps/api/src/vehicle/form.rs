//! Form State Controller: owns the draft listing, the make/model option lists and the
//! submit workflow.
//!
//! State changes are synchronous. Anything that needs the network is handed back to the
//! caller as a ticket (`FetchPlan`, `SubmitPlan`) so the session lock is never held across
//! I/O. Each ticket remembers the governing key(s) it was issued for plus a sequence
//! number; results whose ticket is no longer the latest for the current keys are dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::vehicle::lookup::VehicleLookup;
use crate::vehicle::models::{
    Condition, DescriptionMode, Drivetrain, EntryMethod, GeneratedDescription, InteriorType,
    ListingDetails, TitleStatus, Transmission, VehicleRecord,
};
use crate::vehicle::schemas;

// ────────────────────────────────────────────────────────────────────────────
// Draft state and events
// ────────────────────────────────────────────────────────────────────────────

/// The user's working copy of the listing. Year is kept as entered so an out-of-range
/// value can be shown back with its error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftForm {
    pub method: EntryMethod,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub engine_size: String,
    pub transmission: Transmission,
    pub drivetrain: Drivetrain,
    pub exterior_color: String,
    pub interior_color: String,
    pub interior_type: InteriorType,
    pub title_status: TitleStatus,
    pub price: Option<f64>,
    pub miles: u32,
    pub condition: Condition,
    pub additional_details: String,
    pub description_mode: DescriptionMode,
}

impl Default for DraftForm {
    fn default() -> Self {
        Self {
            method: EntryMethod::default(),
            vin: String::new(),
            year: schemas::current_year(),
            make: String::new(),
            model: String::new(),
            engine_size: String::new(),
            transmission: Transmission::default(),
            drivetrain: Drivetrain::default(),
            exterior_color: String::new(),
            interior_color: String::new(),
            interior_type: InteriorType::default(),
            title_status: TitleStatus::default(),
            price: None,
            miles: 0,
            condition: Condition::default(),
            additional_details: String::new(),
            description_mode: DescriptionMode::default(),
        }
    }
}

/// A single field edit from the presentation layer.
/// Wire form: `{"field": "year", "value": 2020}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FormEvent {
    Method(EntryMethod),
    Vin(String),
    Year(i32),
    Make(String),
    Model(String),
    EngineSize(String),
    Transmission(Transmission),
    Drivetrain(Drivetrain),
    ExteriorColor(String),
    InteriorColor(String),
    InteriorType(InteriorType),
    TitleStatus(TitleStatus),
    Price(Option<f64>),
    Miles(i64),
    Condition(Condition),
    AdditionalDetails(String),
    DescriptionMode(DescriptionMode),
}

// ────────────────────────────────────────────────────────────────────────────
// Dependent fetch tickets
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakesTicket {
    seq: u64,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelsTicket {
    seq: u64,
    pub make: String,
    pub year: i32,
}

/// Lookups the caller must run after an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPlan {
    pub makes: Option<MakesTicket>,
    pub models: Option<ModelsTicket>,
}

/// Outcomes of a `FetchPlan`, ready to hand back to the controller.
#[derive(Debug)]
pub struct FetchResults {
    pub makes: Option<(MakesTicket, Result<Vec<String>, AppError>)>,
    pub models: Option<(ModelsTicket, Result<Vec<String>, AppError>)>,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        self.makes.is_none() && self.models.is_none()
    }

    pub async fn run(self, lookup: &VehicleLookup) -> FetchResults {
        let makes = match self.makes {
            Some(ticket) => {
                let result = lookup.list_makes_for_year(ticket.year).await;
                Some((ticket, result))
            }
            None => None,
        };
        let models = match self.models {
            Some(ticket) => {
                let result = lookup
                    .list_models_for_make_year(&ticket.make, ticket.year)
                    .await;
                Some((ticket, result))
            }
            None => None,
        };
        FetchResults { makes, models }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Submit
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot of everything a submit needs, taken when the submit starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPlan {
    pub method: EntryMethod,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub engine_size: Option<String>,
    pub transmission: Transmission,
    pub drivetrain: Drivetrain,
    pub listing: ListingDetails,
    pub miles: u32,
    pub condition: Condition,
    pub additional_details: String,
    pub mode: DescriptionMode,
}

impl SubmitPlan {
    /// Builds the vehicle record for the plan's entry method.
    /// VIN entry takes identity fields from the decode only; the listing details are
    /// overlaid afterward in both modes.
    pub async fn assemble_record(&self, lookup: &VehicleLookup) -> Result<VehicleRecord, AppError> {
        let base = match self.method {
            EntryMethod::Vin => lookup.decode_vin(&self.vin).await?,
            EntryMethod::Manual => VehicleRecord {
                year: schemas::validate_year(self.year)?,
                make: schemas::validate_make(&self.make)?,
                model: schemas::validate_model(&self.model)?,
                engine_size: self.engine_size.clone(),
                transmission: Some(self.transmission),
                drivetrain: Some(self.drivetrain),
                ..Default::default()
            },
        };
        Ok(base.with_listing_details(self.listing.clone()))
    }

    pub async fn execute(&self, lookup: &VehicleLookup) -> Result<GeneratedDescription, AppError> {
        let record = self.assemble_record(lookup).await?;
        let text = lookup
            .generate_description(
                &record,
                i64::from(self.miles),
                self.condition.as_str(),
                &self.additional_details,
                self.mode,
            )
            .await?;
        Ok(GeneratedDescription {
            text,
            mode: self.mode,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

/// What the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub draft: DraftForm,
    pub makes: Vec<String>,
    pub models: Vec<String>,
    pub loading_makes: bool,
    pub loading_models: bool,
    pub make_error: Option<String>,
    pub model_error: Option<String>,
    pub submit_error: Option<String>,
    pub generating: bool,
    pub description: Option<GeneratedDescription>,
}

#[derive(Debug, Default)]
pub struct FormController {
    draft: DraftForm,
    makes: Vec<String>,
    models: Vec<String>,
    loading_makes: bool,
    loading_models: bool,
    make_error: Option<String>,
    model_error: Option<String>,
    submit_error: Option<String>,
    generating: bool,
    description: Option<GeneratedDescription>,
    makes_seq: u64,
    models_seq: u64,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn draft(&self) -> &DraftForm {
        &self.draft
    }

    #[cfg(test)]
    pub fn makes(&self) -> &[String] {
        &self.makes
    }

    #[cfg(test)]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[cfg(test)]
    pub fn description(&self) -> Option<&GeneratedDescription> {
        self.description.as_ref()
    }

    #[cfg(test)]
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn snapshot(&self) -> FormView {
        FormView {
            draft: self.draft.clone(),
            makes: self.makes.clone(),
            models: self.models.clone(),
            loading_makes: self.loading_makes,
            loading_models: self.loading_models,
            make_error: self.make_error.clone(),
            model_error: self.model_error.clone(),
            submit_error: self.submit_error.clone(),
            generating: self.generating,
            description: self.description.clone(),
        }
    }

    /// Applies one field edit and returns the dependent lookups it triggered.
    /// Fails only when the new value itself is invalid; the draft is then left untouched.
    pub fn apply(&mut self, event: FormEvent) -> Result<FetchPlan, AppError> {
        let mut plan = FetchPlan::default();

        match event {
            FormEvent::Method(method) => {
                if method == self.draft.method {
                    return Ok(plan);
                }
                self.draft.method = method;
                match method {
                    EntryMethod::Manual => {
                        self.draft.make.clear();
                        self.draft.model.clear();
                        self.invalidate_models();
                        plan.makes = Some(self.issue_makes());
                    }
                    // Pending option lookups no longer have a consumer.
                    EntryMethod::Vin => self.stop_loading(),
                }
            }
            FormEvent::Year(year) => {
                self.draft.year = year;
                self.draft.make.clear();
                self.draft.model.clear();
                self.invalidate_models();
                if self.draft.method == EntryMethod::Manual {
                    plan.makes = Some(self.issue_makes());
                }
            }
            FormEvent::Make(make) => {
                self.draft.make = make;
                self.draft.model.clear();
                self.model_error = None;
                if self.draft.method == EntryMethod::Manual {
                    if self.draft.make.trim().is_empty() {
                        self.invalidate_models();
                    } else {
                        plan.models = Some(self.issue_models());
                    }
                }
            }
            FormEvent::Model(model) => self.draft.model = model,
            FormEvent::Vin(vin) => self.draft.vin = vin,
            FormEvent::EngineSize(engine_size) => self.draft.engine_size = engine_size,
            FormEvent::Transmission(transmission) => self.draft.transmission = transmission,
            FormEvent::Drivetrain(drivetrain) => self.draft.drivetrain = drivetrain,
            FormEvent::ExteriorColor(color) => self.draft.exterior_color = color,
            FormEvent::InteriorColor(color) => self.draft.interior_color = color,
            FormEvent::InteriorType(interior_type) => self.draft.interior_type = interior_type,
            FormEvent::TitleStatus(title_status) => self.draft.title_status = title_status,
            FormEvent::Price(price) => {
                self.draft.price = price.map(schemas::validate_price).transpose()?;
            }
            FormEvent::Miles(miles) => self.draft.miles = schemas::validate_miles(miles)?,
            FormEvent::Condition(condition) => self.draft.condition = condition,
            FormEvent::AdditionalDetails(details) => self.draft.additional_details = details,
            FormEvent::DescriptionMode(mode) => self.draft.description_mode = mode,
        }

        Ok(plan)
    }

    /// Clears the model selection's dependents and retires any in-flight model lookup.
    fn invalidate_models(&mut self) {
        self.models_seq += 1;
        self.models.clear();
        self.model_error = None;
        self.loading_models = false;
    }

    fn issue_makes(&mut self) -> MakesTicket {
        self.makes_seq += 1;
        self.makes.clear();
        self.make_error = None;
        self.loading_makes = true;
        MakesTicket {
            seq: self.makes_seq,
            year: self.draft.year,
        }
    }

    fn issue_models(&mut self) -> ModelsTicket {
        self.models_seq += 1;
        self.models.clear();
        self.model_error = None;
        self.loading_models = true;
        ModelsTicket {
            seq: self.models_seq,
            make: self.draft.make.clone(),
            year: self.draft.year,
        }
    }

    /// Returns `false` when the result was stale and dropped.
    pub fn apply_makes(
        &mut self,
        ticket: &MakesTicket,
        result: Result<Vec<String>, AppError>,
    ) -> bool {
        let current = ticket.seq == self.makes_seq
            && self.draft.method == EntryMethod::Manual
            && ticket.year == self.draft.year;
        if !current {
            debug!("Discarding stale makes result for year {}", ticket.year);
            return false;
        }

        self.loading_makes = false;
        match result {
            Ok(makes) => {
                self.makes = makes;
                self.make_error = None;
            }
            Err(e) => {
                self.make_error = Some(e.user_message());
                self.makes.clear();
            }
        }
        true
    }

    /// Returns `false` when the result was stale and dropped.
    pub fn apply_models(
        &mut self,
        ticket: &ModelsTicket,
        result: Result<Vec<String>, AppError>,
    ) -> bool {
        let current = ticket.seq == self.models_seq
            && self.draft.method == EntryMethod::Manual
            && ticket.year == self.draft.year
            && ticket.make == self.draft.make;
        if !current {
            debug!(
                "Discarding stale models result for {} {}",
                ticket.year, ticket.make
            );
            return false;
        }

        self.loading_models = false;
        match result {
            Ok(models) => {
                self.models = models;
                self.model_error = None;
            }
            Err(e) => {
                self.model_error = Some(e.user_message());
                self.models.clear();
            }
        }
        true
    }

    pub fn apply_fetch_results(&mut self, results: FetchResults) {
        if let Some((ticket, result)) = results.makes {
            self.apply_makes(&ticket, result);
        }
        if let Some((ticket, result)) = results.models {
            self.apply_models(&ticket, result);
        }
    }

    /// Drops both loading indicators and retires any outstanding option lookups.
    pub fn stop_loading(&mut self) {
        self.makes_seq += 1;
        self.models_seq += 1;
        self.loading_makes = false;
        self.loading_models = false;
    }

    /// Starts a submit. Returns `None` while another submit is still in flight.
    pub fn begin_submit(&mut self) -> Option<SubmitPlan> {
        if self.generating {
            return None;
        }
        self.generating = true;
        self.description = None;
        self.submit_error = None;

        let draft = &self.draft;
        Some(SubmitPlan {
            method: draft.method,
            vin: draft.vin.clone(),
            year: draft.year,
            make: draft.make.clone(),
            model: draft.model.clone(),
            engine_size: non_blank(&draft.engine_size),
            transmission: draft.transmission,
            drivetrain: draft.drivetrain,
            listing: ListingDetails {
                price: draft.price,
                exterior_color: non_blank(&draft.exterior_color),
                interior_color: non_blank(&draft.interior_color),
                interior_type: Some(draft.interior_type),
                title_status: Some(draft.title_status),
            },
            miles: draft.miles,
            condition: draft.condition,
            additional_details: draft.additional_details.clone(),
            mode: draft.description_mode,
        })
    }

    pub fn finish_submit(&mut self, result: Result<GeneratedDescription, AppError>) {
        self.generating = false;
        match result {
            Ok(description) => {
                self.description = Some(description);
                self.submit_error = None;
            }
            Err(e) => {
                warn!("Description generation failed: {e}");
                self.submit_error = Some(e.user_message());
            }
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Session-level drivers
// ────────────────────────────────────────────────────────────────────────────

pub type SharedForm = Arc<Mutex<FormController>>;

/// Applies `event`, runs the lookups it triggered without holding the lock, then
/// applies whatever results are still current.
///
/// The lookups run on their own task, so results still land (and loading flags clear)
/// if the caller stops waiting.
pub async fn dispatch_event(
    form: &SharedForm,
    lookup: &VehicleLookup,
    event: FormEvent,
) -> Result<FormView, AppError> {
    let plan = form.lock().await.apply(event)?;

    if !plan.is_empty() {
        let task_form = form.clone();
        let lookup = lookup.clone();
        let task = tokio::spawn(async move {
            let results = plan.run(&lookup).await;
            task_form.lock().await.apply_fetch_results(results);
        });
        if let Err(e) = task.await {
            warn!("Option lookup task failed: {e}");
            form.lock().await.stop_loading();
        }
    }

    Ok(form.lock().await.snapshot())
}

/// Runs the submit workflow. `Conflict` when a submit for this form is already in flight.
///
/// Generation runs on its own task: a dropped request still ends with `finish_submit`,
/// so the in-flight flag is always released.
pub async fn submit(form: &SharedForm, lookup: &VehicleLookup) -> Result<FormView, AppError> {
    let plan = form.lock().await.begin_submit().ok_or_else(|| {
        AppError::Conflict("A description is already being generated".to_string())
    })?;

    info!("Generating {:?} description via {:?} entry", plan.mode, plan.method);

    let task_form = form.clone();
    let lookup = lookup.clone();
    let task = tokio::spawn(async move {
        let result = plan.execute(&lookup).await;
        let mut guard = task_form.lock().await;
        guard.finish_submit(result);
        guard.snapshot()
    });

    match task.await {
        Ok(view) => Ok(view),
        Err(e) => {
            let mut guard = form.lock().await;
            guard.finish_submit(Err(AppError::Generation(
                "Failed to generate description".to_string(),
            )));
            warn!("Submit task failed: {e}");
            Ok(guard.snapshot())
        }
    }
}
