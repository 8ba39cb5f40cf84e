//! Sample guide fragments in the shape the content generator produces.
//!
//! Each one exercises a different part of the brand vocabulary.

/// Hero banner plus a short introduction.
pub fn hero() -> &'static str {
    r##"<div class="bg-[#eef3fe] rounded-2xl p-8 mb-8">
  <h1 class="text-3xl font-bold text-[#005fc5] mb-4">Guía de Gastos Comunes</h1>
  <p class="text-lg leading-relaxed">Todo lo que necesitas saber para pagar y entender los gastos comunes de tu comunidad.</p>
</div>
<p class="leading-relaxed mb-6">Los gastos comunes financian la mantención, la seguridad y los servicios compartidos del edificio.</p>"##
}

/// Three cards in a responsive grid, each with a top accent border.
pub fn card_grid() -> &'static str {
    r##"<h2 class="text-2xl font-bold text-[#4e526e] mb-4">¿Cómo pagar?</h2>
<div class="grid grid-cols-1 md:grid-cols-3 gap-6 mb-8">
  <div class="bg-white p-6 rounded-xl shadow-sm border-t-4 border-[#4cbf8c]">
    <h3 class="font-bold text-lg mb-2">Transferencia</h3>
    <p class="text-sm">Usa los datos bancarios publicados en la plataforma.</p>
  </div>
  <div class="bg-white p-6 rounded-xl shadow-sm border-t-4 border-[#005fc5]">
    <h3 class="font-bold text-lg mb-2">Pago en línea</h3>
    <p class="text-sm">Paga con tarjeta desde la app de <strong>ComunidadFeliz</strong>.</p>
  </div>
  <div class="bg-white p-6 rounded-xl shadow-sm border-t-4 border-[#ffc000]">
    <h3 class="font-bold text-lg mb-2">Conserjería</h3>
    <p class="text-sm">Entrega el comprobante en conserjería antes del día 10.</p>
  </div>
</div>"##
}

/// Numbered timeline with a highlighted warning.
pub fn timeline() -> &'static str {
    r##"<h2 class="text-2xl font-bold mb-4">Calendario mensual</h2>
<div class="space-y-4 mb-8">
  <div class="flex gap-4 items-start">
    <div class="w-10 h-10 bg-[#4cbf8c] rounded-full flex items-center justify-center"><span class="text-white font-bold">1</span></div>
    <div class="flex-1"><h4 class="font-semibold">Día 1</h4><p>Se publica la boleta de gastos comunes.</p></div>
  </div>
  <div class="flex gap-4 items-start">
    <div class="w-10 h-10 bg-[#005fc5] rounded-full flex items-center justify-center"><span class="text-white font-bold">2</span></div>
    <div class="flex-1"><h4 class="font-semibold">Día 10</h4><p>Vence el plazo de pago sin recargo.</p></div>
  </div>
</div>
<div class="bg-[#ff6b75]/10 border border-[#ff6b75] rounded-xl p-4">
  <p class="text-[#ff6b75] font-semibold">Atención: los pagos atrasados generan intereses.</p>
</div>"##
}

/// Table of charges.
pub fn charges_table() -> &'static str {
    r##"<h2 class="text-2xl font-bold mb-4">Detalle de cobros</h2>
<table class="w-full mb-6">
  <tr><th>Concepto</th><th>Monto</th></tr>
  <tr><td>Administración</td><td>$45.000</td></tr>
  <tr><td>Fondo de reserva</td><td>$4.500</td></tr>
  <tr><td>Consumo de agua</td><td>$12.300</td></tr>
</table>"##
}

/// Every sample concatenated into one guide.
pub fn full_guide() -> String {
    [hero(), card_grid(), timeline(), charges_table()].join("\n")
}

/// A guide long enough to span several A4 pages.
pub fn long_guide(sections: usize) -> String {
    (1..=sections)
        .map(|i| {
            format!(
                r##"<h2 class="text-2xl font-bold mb-2">Sección {i}</h2>
<div class="bg-white p-6 rounded-xl shadow-sm mb-6">
  <p class="leading-relaxed">La asamblea de copropietarios define el presupuesto anual y el comité de administración vela por su cumplimiento. Cada unidad paga según su prorrateo.</p>
  <ul class="list-disc pl-6">
    <li>Revisa tu boleta en la plataforma.</li>
    <li>Reporta cualquier diferencia a la administración.</li>
  </ul>
</div>"##
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `inner` wrapped in `levels` plain divs.
pub fn nested_divs(levels: usize, inner: &str) -> String {
    format!("{}{inner}{}", "<div>".repeat(levels), "</div>".repeat(levels))
}
