pub mod boxplot;

mod axes_draw;
