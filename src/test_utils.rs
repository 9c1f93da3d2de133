use crate::table::{Column, Table};

use time::macros::date;

/// A small radiance table: three Merida rows, two Kanasin rows, with the
/// radiance statistics columns the aggregation endpoints touch.
pub(crate) fn radiance_table() -> Table {
    let mut table = Table::new();
    table.push_column(
        "Municipio",
        Column::Text(vec![
            Some("Merida".to_string()),
            Some("Merida".to_string()),
            Some("Merida".to_string()),
            Some("Kanasin".to_string()),
            Some("Kanasin".to_string()),
        ]),
    );
    table.push_column(
        "Fecha",
        Column::Date(vec![
            Some(date!(2020 - 01 - 15)),
            Some(date!(2020 - 06 - 10)),
            Some(date!(2021 - 03 - 05)),
            Some(date!(2020 - 09 - 01)),
            Some(date!(2021 - 06 - 20)),
        ]),
    );
    table.push_column(
        "Media_de_radianza",
        Column::Number(vec![Some(5.0), Some(6.0), Some(7.0), Some(2.0), Some(3.0)]),
    );
    table.push_column(
        "Suma_de_radianza",
        Column::Number(vec![
            Some(50.0),
            Some(60.0),
            Some(70.0),
            Some(20.0),
            Some(30.0),
        ]),
    );
    table.push_column(
        "Maximo_de_radianza",
        Column::Number(vec![Some(9.0), Some(8.0), Some(11.0), Some(4.0), Some(5.0)]),
    );
    table.push_column(
        "Minimo_de_radianza",
        Column::Number(vec![Some(1.0), Some(2.0), Some(3.0), Some(0.5), Some(1.5)]),
    );
    table
}

/// A small GDP table. The first municipality is deliberately uppercased with
/// trailing whitespace to exercise join key normalization.
pub(crate) fn gdp_table() -> Table {
    let mut table = Table::new();
    table.push_column(
        "municipio",
        Column::Text(vec![
            Some("MERIDA ".to_string()),
            Some("Kanasin".to_string()),
            Some("Uman".to_string()),
        ]),
    );
    table.push_column(
        "fecha",
        Column::Date(vec![
            Some(date!(2020 - 01 - 15)),
            Some(date!(2021 - 06 - 20)),
            Some(date!(2020 - 01 - 01)),
        ]),
    );
    table.push_column(
        "entidad_federativa",
        Column::Text(vec![
            Some("Yucatan".to_string()),
            Some("Yucatan".to_string()),
            Some("Yucatan".to_string()),
        ]),
    );
    table.push_column(
        "pib_mun",
        Column::Number(vec![Some(1000.0), Some(400.0), Some(150.0)]),
    );
    table.push_column(
        "pibe",
        Column::Number(vec![Some(90.0), Some(90.0), Some(90.0)]),
    );
    table.push_column(
        "porc_pob",
        Column::Number(vec![Some(42.0), Some(6.5), Some(2.1)]),
    );
    table
}

/// Radiance dataset CSV matching [radiance_table], as served from object
/// storage.
pub(crate) const RADIANCE_CSV: &str = "\
Municipio,Fecha,Media_de_radianza,Suma_de_radianza,Maximo_de_radianza,Minimo_de_radianza
Merida,2020-01-15,5.0,50.0,9.0,1.0
Merida,2020-06-10,6.0,60.0,8.0,2.0
Merida,2021-03-05,7.0,70.0,11.0,3.0
Kanasin,2020-09-01,2.0,20.0,4.0,0.5
Kanasin,2021-06-20,3.0,30.0,5.0,1.5
";

/// GDP dataset CSV matching [gdp_table], with locale decimal separators.
pub(crate) const GDP_CSV: &str = "\
municipio,fecha,entidad_federativa,pib_mun,pibe,porc_pob
MERIDA ,2020-01-15,Yucatan,\"1000,0\",\"90,0\",\"42,0\"
Kanasin,2021-06-20,Yucatan,\"400,0\",\"90,0\",\"6,5\"
Uman,2020-01-01,Yucatan,\"150,0\",\"90,0\",\"2,1\"
";
