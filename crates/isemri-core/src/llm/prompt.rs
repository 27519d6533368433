//! Prompt construction for the generation service.

/// Build the extraction prompt around raw OCR text.
///
/// The instructions are in Turkish, matching the document language, and ask
/// for bare JSON in a fixed schema. Models still wrap the answer in prose or
/// code fences often enough that the response side sanitizes regardless.
pub fn build_prompt(raw_text: &str) -> String {
    format!(
        r#"Aşağıda bir araç servis iş emri formunun OCR metni var. Bu metinden
bilgileri çıkar ve SADECE geçerli bir JSON nesnesi olarak döndür. Açıklama,
yorum veya kod bloğu ekleme.

JSON şeması:
{{
  "customer": {{"kind": "person|company", "name": "...", "phone": "...", "email": "..."}},
  "vehicle": {{"plate": "...", "brand": "...", "model": "...", "year": 2020, "km": 85000}},
  "started_at": "YYYY-MM-DD",
  "items": [{{"kind": "labor|part", "name": "...", "qty": 1, "unit_price": 0.0}}],
  "totals": {{"subtotal": 0.0, "vat_rate": 0.20, "vat_amount": 0.0, "grand_total": 0.0}},
  "status": "open|closed",
  "notes": "..."
}}

Kurallar:
- Emin olmadığın alanları null bırak.
- Plakayı boşluksuz ve büyük harfle yaz.
- Tutarları sayı olarak yaz, para birimi ekleme.
- "işçilik" geçen kalemler labor, diğerleri part.

OCR metni:
{raw_text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_schema() {
        let prompt = build_prompt("Plaka: 34 ABC 123");
        assert!(prompt.contains("Plaka: 34 ABC 123"));
        assert!(prompt.contains("\"customer\""));
        assert!(prompt.contains("\"grand_total\""));
    }
}
