//! Invoice draft (mutable, pre-save billing form).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FeeCalculator, InvoiceError, InvoiceResult};
use crate::models::{invoice_total, Examination, NewInvoice, Vnd};

/// Where the medicine fee on a draft comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MedicineFee {
    /// Entered by the operator; no examination selected yet
    Manual(Vnd),
    /// Derived from the selected examination's prescription (read-only)
    Calculated { examination_id: String, amount: Vnd },
}

impl MedicineFee {
    pub fn amount(&self) -> Vnd {
        match self {
            MedicineFee::Manual(amount) => *amount,
            MedicineFee::Calculated { amount, .. } => *amount,
        }
    }
}

/// An invoice being prepared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceDraft {
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: NaiveDate,
    consultation_fee: Vnd,
    medicine_fee: MedicineFee,
    other_fees: Vnd,
}

impl InvoiceDraft {
    /// Start a draft with the current consultation fee and no other charges.
    pub fn new(
        patient_id: String,
        patient_name: String,
        exam_date: NaiveDate,
        consultation_fee: Vnd,
    ) -> Self {
        Self {
            patient_id,
            patient_name,
            exam_date,
            consultation_fee: consultation_fee.max(0),
            medicine_fee: MedicineFee::Manual(0),
            other_fees: 0,
        }
    }

    pub fn consultation_fee(&self) -> Vnd {
        self.consultation_fee
    }

    pub fn other_fees(&self) -> Vnd {
        self.other_fees
    }

    pub fn medicine_fee(&self) -> Vnd {
        self.medicine_fee.amount()
    }

    /// Medicine fee with its provenance.
    pub fn medicine_fee_source(&self) -> &MedicineFee {
        &self.medicine_fee
    }

    /// Check if the medicine fee is controlled by a selected examination.
    pub fn is_medicine_fee_locked(&self) -> bool {
        matches!(self.medicine_fee, MedicineFee::Calculated { .. })
    }

    /// ID of the examination driving the medicine fee, if any.
    pub fn selected_examination(&self) -> Option<&str> {
        match &self.medicine_fee {
            MedicineFee::Calculated { examination_id, .. } => Some(examination_id),
            MedicineFee::Manual(_) => None,
        }
    }

    pub fn set_consultation_fee(&mut self, fee: Vnd) -> InvoiceResult<()> {
        self.consultation_fee = non_negative(fee)?;
        Ok(())
    }

    pub fn set_other_fees(&mut self, fee: Vnd) -> InvoiceResult<()> {
        self.other_fees = non_negative(fee)?;
        Ok(())
    }

    /// Set the medicine fee by hand. Rejected once an examination is selected.
    pub fn set_medicine_fee(&mut self, fee: Vnd) -> InvoiceResult<()> {
        if let MedicineFee::Calculated { examination_id, .. } = &self.medicine_fee {
            return Err(InvoiceError::MedicineFeeLocked(examination_id.clone()));
        }
        self.medicine_fee = MedicineFee::Manual(non_negative(fee)?);
        Ok(())
    }

    /// Bill against an examination. Takes over patient and date from it and
    /// recomputes the medicine fee from scratch, discarding the previous value.
    pub fn select_examination(
        &mut self,
        examination: &Examination,
        calculator: &FeeCalculator,
    ) -> InvoiceResult<Vnd> {
        let exam_date = examination
            .exam_date
            .ok_or_else(|| InvoiceError::MissingExamDate(examination.id.clone()))?;

        let amount = calculator.medicine_fee(examination);
        self.patient_id = examination.patient_id.clone();
        self.patient_name = examination.patient_name.clone();
        self.exam_date = exam_date;
        self.medicine_fee = MedicineFee::Calculated {
            examination_id: examination.id.clone(),
            amount,
        };
        Ok(amount)
    }

    /// Re-run the medicine fee computation for an examination on demand.
    pub fn recalculate(
        &mut self,
        examination: &Examination,
        calculator: &FeeCalculator,
    ) -> InvoiceResult<Vnd> {
        self.select_examination(examination, calculator)
    }

    /// Current total, always recomputed from the three components.
    pub fn total(&self) -> Vnd {
        invoice_total(self.consultation_fee, self.medicine_fee(), self.other_fees)
    }

    /// Build the invoice to store.
    pub fn finalize(&self) -> NewInvoice {
        NewInvoice::new(
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.exam_date,
            self.consultation_fee,
            self.medicine_fee(),
            self.other_fees,
        )
    }
}

fn non_negative(fee: Vnd) -> InvoiceResult<Vnd> {
    if fee < 0 {
        return Err(InvoiceError::NegativeFee(fee));
    }
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, MedicineUnit};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn make_exam(id: &str, medicines: Vec<Medicine>) -> Examination {
        Examination {
            id: id.into(),
            patient_id: "p-1".into(),
            patient_name: "Nguyễn Văn An".into(),
            exam_date: Some(date(3)),
            symptoms: "Ho".into(),
            diagnosis: "Viêm họng".into(),
            medicines,
        }
    }

    fn make_draft() -> InvoiceDraft {
        InvoiceDraft::new(String::new(), String::new(), date(1), 150_000)
    }

    #[test]
    fn test_manual_fee_until_examination_selected() {
        let mut draft = make_draft();
        assert!(!draft.is_medicine_fee_locked());

        draft.set_medicine_fee(42_000).unwrap();
        assert_eq!(draft.medicine_fee(), 42_000);
        assert!(matches!(draft.medicine_fee_source(), MedicineFee::Manual(42_000)));
        assert_eq!(draft.total(), 192_000);
    }

    #[test]
    fn test_selecting_examination_locks_fee() {
        let calculator = FeeCalculator::new();
        let mut draft = make_draft();
        draft.set_medicine_fee(42_000).unwrap();

        let exam = make_exam("exam-1", vec![Medicine::new("Paracetamol", MedicineUnit::Vien, 20)]);
        let fee = draft.select_examination(&exam, &calculator).unwrap();

        assert_eq!(fee, 100_000);
        assert_eq!(draft.medicine_fee(), 100_000);
        assert_eq!(draft.patient_id, "p-1");
        assert_eq!(draft.exam_date, date(3));
        assert_eq!(draft.selected_examination(), Some("exam-1"));
        assert!(matches!(
            draft.medicine_fee_source(),
            MedicineFee::Calculated { examination_id, amount: 100_000 } if examination_id == "exam-1"
        ));
        assert_eq!(
            draft.set_medicine_fee(1),
            Err(InvoiceError::MedicineFeeLocked("exam-1".into()))
        );
        assert_eq!(draft.medicine_fee(), 100_000);
    }

    #[test]
    fn test_reselecting_recomputes_from_scratch() {
        let calculator = FeeCalculator::new();
        let mut draft = make_draft();

        let first = make_exam("exam-1", vec![Medicine::new("Paracetamol", MedicineUnit::Vien, 20)]);
        let second = make_exam("exam-2", vec![Medicine::new("Siro", MedicineUnit::Chai, 2)]);

        draft.select_examination(&first, &calculator).unwrap();
        draft.select_examination(&second, &calculator).unwrap();

        assert_eq!(draft.medicine_fee(), 50_000);
        assert_eq!(draft.selected_examination(), Some("exam-2"));
    }

    #[test]
    fn test_recalculate_picks_up_changes() {
        let calculator = FeeCalculator::new();
        let mut draft = make_draft();
        let mut exam = make_exam("exam-1", vec![Medicine::new("Paracetamol", MedicineUnit::Vien, 20)]);
        draft.select_examination(&exam, &calculator).unwrap();

        exam.medicines[0].quantity = 10;
        assert_eq!(draft.recalculate(&exam, &calculator).unwrap(), 50_000);
    }

    #[test]
    fn test_examination_without_date_is_rejected() {
        let calculator = FeeCalculator::new();
        let mut draft = make_draft();
        let mut exam = make_exam("exam-1", vec![]);
        exam.exam_date = None;

        assert_eq!(
            draft.select_examination(&exam, &calculator),
            Err(InvoiceError::MissingExamDate("exam-1".into()))
        );
        assert!(!draft.is_medicine_fee_locked());
    }

    #[test]
    fn test_negative_fees_rejected() {
        let mut draft = make_draft();
        assert_eq!(draft.set_other_fees(-1), Err(InvoiceError::NegativeFee(-1)));
        assert_eq!(draft.set_consultation_fee(-5), Err(InvoiceError::NegativeFee(-5)));
        assert_eq!(draft.other_fees(), 0);
    }

    #[test]
    fn test_finalize_total_matches_components() {
        let calculator = FeeCalculator::new();
        let mut draft = make_draft();
        let exam = make_exam("exam-1", vec![Medicine::new("Paracetamol", MedicineUnit::Vien, 20)]);
        draft.select_examination(&exam, &calculator).unwrap();
        draft.set_other_fees(30_000).unwrap();

        let invoice = draft.finalize();
        assert_eq!(invoice.total_amount, 150_000 + 100_000 + 30_000);
        assert_eq!(
            invoice.total_amount,
            invoice.consultation_fee + invoice.medicine_fee + invoice.other_fees
        );
    }
}
