//! Known service names offered at the counter.
//!
//! The catalog is advisory: transactions may carry any service name, but the
//! charts use it to list services that were never sold in the period.

pub const SERVICE_CATALOG: [&str; 30] = [
    "SERVICIO REDACCION CONTRATO LEGAL",
    "SERVICIO REDACCION CONTRATO NOTARIAL",
    "SERVICIO REDACCION INSTANCIA",
    "SERVICIO REDACCION INSTANCIA EXTENSA",
    "SERVICIO REDACCION ESCRITO AMPLIO",
    "SERVICIO REDACCION COLETILLA",
    "SERVICIO REDACCION TRADUCCION JUDICIAL",
    "SERVICIO REDACCION NOTIFICACION",
    "SERVICIO REDACCION TRADUCCION JUDICIAL EXTENSA",
    "SERVICIO DE REDACCION OTROS",
    "SERVICIO FORMATO E IMPRESION",
    "SERVICIO DE IMPRESION",
    "SERVICIO DE IMPRESION DOCUMENTO LEGAL",
    "SERVICIO DE IMPRESION DOCUMENTO NORMAL",
    "SERVICIO DE IMPRESION FOTO 2x2",
    "SERVICIO DE COPIA BLANCO Y NEGRO",
    "SERVICIO DE COPIA A COLOR",
    "SERVICIO DE ESCANER DOCUMENTO DIGITAL",
    "SERVICIO SOLICITUD CERTIFICACION APOSTILLE",
    "SERVICIO SOLICITUD CERTIFICACION VIAJE DE MENOR",
    "SERVICIO SOLICITUD CERTIFICACION ESTATUS JURIDICO DE INMUEBLE",
    "SERVICIO SOLICITUD INSCRIPCION DE INMUEBLE",
    "SERVICIO SOLICITUD CERTIFICACION CAMARA DE COMERCIO",
    "SERVICIO SOLICITUD DE CERTIFICACION PROCURADURIA GENERAL",
    "SERVICIO SOLICITUD DE CERTIFICACION ANTECEDENTES NO PENALES",
    "SERVICIO SOLICITUD DE CERTIFICACION OTROS",
    "SERVICIO MENSAJERIA",
    "SERVICIO MENSAJERIA COMPRA IMPUESTOS",
    "SERVICIO MENSAJERIA DEPOSITO DOCUMENTOS",
    "SERVICIO COMPRA IMPUESTOS",
];

pub fn is_known_service(name: &str) -> bool {
    SERVICE_CATALOG.contains(&name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_entries_are_unique() {
        let unique: HashSet<_> = SERVICE_CATALOG.iter().collect();
        assert_eq!(unique.len(), SERVICE_CATALOG.len());
    }

    #[test]
    fn test_known_service_lookup() {
        assert!(is_known_service("SERVICIO MENSAJERIA"));
        assert!(is_known_service(" SERVICIO DE IMPRESION "));
        assert!(!is_known_service("Asesoría fiscal"));
    }
}
